use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Invoices::BusinessId).uuid().not_null())
                    .col(
                        ColumnDef::new(Invoices::GatewayOrderId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Invoices::GatewayPaymentId).string().null())
                    .col(ColumnDef::new(Invoices::Amount).decimal().not_null())
                    .col(
                        ColumnDef::new(Invoices::Currency)
                            .string()
                            .not_null()
                            .default("INR"),
                    )
                    .col(
                        ColumnDef::new(Invoices::Status)
                            .string()
                            .not_null()
                            .default("created"),
                    )
                    .col(ColumnDef::new(Invoices::PlanType).string().not_null())
                    .col(
                        ColumnDef::new(Invoices::PeriodMonths)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Invoices::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_business_id")
                    .table(Invoices::Table)
                    .col(Invoices::BusinessId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Invoices {
    Table,
    Id,
    BusinessId,
    GatewayOrderId,
    GatewayPaymentId,
    Amount,
    Currency,
    Status,
    PlanType,
    PeriodMonths,
    CreatedAt,
    UpdatedAt,
}
