use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderStatusHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderStatusHistory::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatusHistory::OrderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatusHistory::FromStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatusHistory::ToStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatusHistory::ChangedBy)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderStatusHistory::Notes).text().null())
                    .col(
                        ColumnDef::new(OrderStatusHistory::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_status_history_order_id")
                    .table(OrderStatusHistory::Table)
                    .col(OrderStatusHistory::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderStatusHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrderStatusHistory {
    Table,
    Id,
    OrderId,
    FromStatus,
    ToStatus,
    ChangedBy,
    Notes,
    CreatedAt,
}
