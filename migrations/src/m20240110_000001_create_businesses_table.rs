use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Businesses::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Businesses::Name).string().not_null())
                    .col(ColumnDef::new(Businesses::Email).string().null())
                    .col(ColumnDef::new(Businesses::Phone).string().null())
                    .col(
                        ColumnDef::new(Businesses::PlanType)
                            .string()
                            .not_null()
                            .default("trial"),
                    )
                    .col(
                        ColumnDef::new(Businesses::PlanStatus)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Businesses::TrialEndsAt).timestamp().null())
                    .col(
                        ColumnDef::new(Businesses::SubscriptionEndsAt)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Businesses::GstEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Businesses::GstPercentage)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Businesses::ExpressMultiplier)
                            .decimal()
                            .not_null()
                            .default(1.5),
                    )
                    .col(
                        ColumnDef::new(Businesses::LowStockPush)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Businesses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Businesses::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Businesses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Businesses {
    Table,
    Id,
    Name,
    Email,
    Phone,
    PlanType,
    PlanStatus,
    TrialEndsAt,
    SubscriptionEndsAt,
    GstEnabled,
    GstPercentage,
    ExpressMultiplier,
    LowStockPush,
    CreatedAt,
    UpdatedAt,
}
