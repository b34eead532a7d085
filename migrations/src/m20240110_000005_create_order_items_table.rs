use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::TagNumber).string().not_null())
                    .col(ColumnDef::new(OrderItems::Name).string().not_null())
                    .col(ColumnDef::new(OrderItems::ServiceType).string().null())
                    .col(
                        ColumnDef::new(OrderItems::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(OrderItems::UnitPrice).decimal().not_null())
                    .col(
                        ColumnDef::new(OrderItems::IsExpress)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(OrderItems::Subtotal).decimal().not_null())
                    .col(
                        ColumnDef::new(OrderItems::Status)
                            .string()
                            .not_null()
                            .default("received"),
                    )
                    .col(
                        ColumnDef::new(OrderItems::SentToWorkshop)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OrderItems::WorkshopPartnerName)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::WorkshopSentDate)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::WorkshopReturnedDate)
                            .timestamp()
                            .null(),
                    )
                    .col(ColumnDef::new(OrderItems::WorkshopNotes).text().null())
                    .col(ColumnDef::new(OrderItems::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(OrderItems::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_order_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await?;

        // Tag numbers are derived from order numbers, so like order numbers
        // they are unique per tenant, not globally.
        manager
            .create_index(
                Index::create()
                    .name("uq_order_items_business_tag_number")
                    .table(OrderItems::Table)
                    .col(OrderItems::BusinessId)
                    .col(OrderItems::TagNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrderItems {
    Table,
    Id,
    OrderId,
    BusinessId,
    TagNumber,
    Name,
    ServiceType,
    Quantity,
    UnitPrice,
    IsExpress,
    Subtotal,
    Status,
    SentToWorkshop,
    WorkshopPartnerName,
    WorkshopSentDate,
    WorkshopReturnedDate,
    WorkshopNotes,
    CreatedAt,
    UpdatedAt,
}
