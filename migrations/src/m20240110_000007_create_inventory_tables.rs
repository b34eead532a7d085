use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryItems::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                    .col(ColumnDef::new(InventoryItems::Sku).string().null())
                    .col(
                        ColumnDef::new(InventoryItems::Unit)
                            .string()
                            .not_null()
                            .default("pcs"),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::CurrentStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::LowStockThreshold)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::CostPerUnit)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryItems::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_business_sku")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::BusinessId)
                    .col(InventoryItems::Sku)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InventoryRestockLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryRestockLogs::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRestockLogs::InventoryItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRestockLogs::BusinessId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRestockLogs::AdjustmentType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRestockLogs::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRestockLogs::PreviousStock)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRestockLogs::NewStock)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryRestockLogs::Cost).decimal().null())
                    .col(ColumnDef::new(InventoryRestockLogs::Notes).text().null())
                    .col(
                        ColumnDef::new(InventoryRestockLogs::CreatedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRestockLogs::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_restock_logs_item_id")
                    .table(InventoryRestockLogs::Table)
                    .col(InventoryRestockLogs::InventoryItemId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryRestockLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InventoryItems {
    Table,
    Id,
    BusinessId,
    Name,
    Sku,
    Unit,
    CurrentStock,
    LowStockThreshold,
    CostPerUnit,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum InventoryRestockLogs {
    Table,
    Id,
    InventoryItemId,
    BusinessId,
    AdjustmentType,
    Quantity,
    PreviousStock,
    NewStock,
    Cost,
    Notes,
    CreatedBy,
    CreatedAt,
}
