use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Orders::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Orders::StoreId).uuid().not_null())
                    .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Orders::DriverId).uuid().null())
                    .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string()
                            .not_null()
                            .default("pickup"),
                    )
                    .col(
                        ColumnDef::new(Orders::Subtotal)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::Discount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::GstEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Orders::GstPercentage)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::GstAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::PaidAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .string()
                            .not_null()
                            .default("unpaid"),
                    )
                    .col(ColumnDef::new(Orders::PickupDate).timestamp().null())
                    .col(ColumnDef::new(Orders::DeliveryDate).timestamp().null())
                    .col(ColumnDef::new(Orders::PickedUpAt).timestamp().null())
                    .col(ColumnDef::new(Orders::DeliveredAt).timestamp().null())
                    .col(ColumnDef::new(Orders::Notes).text().null())
                    .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Orders::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_business_status")
                    .table(Orders::Table)
                    .col(Orders::BusinessId)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        // Order numbers are unique per tenant; the index doubles as the scan
        // path for the number generator's highest-prefix lookup. Creation
        // relies on this constraint firing under concurrent generation.
        manager
            .create_index(
                Index::create()
                    .name("uq_orders_business_order_number")
                    .table(Orders::Table)
                    .col(Orders::BusinessId)
                    .col(Orders::OrderNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    BusinessId,
    StoreId,
    CustomerId,
    DriverId,
    OrderNumber,
    Status,
    Subtotal,
    Discount,
    GstEnabled,
    GstPercentage,
    GstAmount,
    TotalAmount,
    PaidAmount,
    PaymentStatus,
    PickupDate,
    DeliveryDate,
    PickedUpAt,
    DeliveredAt,
    Notes,
    CreatedAt,
    UpdatedAt,
    Version,
}
