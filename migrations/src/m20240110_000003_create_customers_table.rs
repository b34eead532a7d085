use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Customers::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Phone).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string().null())
                    .col(ColumnDef::new(Customers::Address).text().null())
                    .col(ColumnDef::new(Customers::Notes).text().null())
                    .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Customers::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        // One phone number per customer within a business
        manager
            .create_index(
                Index::create()
                    .name("idx_customers_business_phone")
                    .table(Customers::Table)
                    .col(Customers::BusinessId)
                    .col(Customers::Phone)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Customers {
    Table,
    Id,
    BusinessId,
    Name,
    Phone,
    Email,
    Address,
    Notes,
    CreatedAt,
    UpdatedAt,
}
