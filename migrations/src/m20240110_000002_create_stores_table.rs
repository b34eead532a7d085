use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stores::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stores::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Stores::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Stores::Name).string().not_null())
                    .col(ColumnDef::new(Stores::Address).text().null())
                    .col(ColumnDef::new(Stores::Phone).string().null())
                    .col(ColumnDef::new(Stores::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Stores::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stores_business_id")
                    .table(Stores::Table)
                    .col(Stores::BusinessId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stores::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Stores {
    Table,
    Id,
    BusinessId,
    Name,
    Address,
    Phone,
    CreatedAt,
    UpdatedAt,
}
