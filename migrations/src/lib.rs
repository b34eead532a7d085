pub use sea_orm_migration::prelude::*;

mod m20240110_000001_create_businesses_table;
mod m20240110_000002_create_stores_table;
mod m20240110_000003_create_customers_table;
mod m20240110_000004_create_orders_table;
mod m20240110_000005_create_order_items_table;
mod m20240110_000006_create_order_status_history_table;
mod m20240110_000007_create_inventory_tables;
mod m20240110_000008_create_invoices_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240110_000001_create_businesses_table::Migration),
            Box::new(m20240110_000002_create_stores_table::Migration),
            Box::new(m20240110_000003_create_customers_table::Migration),
            Box::new(m20240110_000004_create_orders_table::Migration),
            Box::new(m20240110_000005_create_order_items_table::Migration),
            Box::new(m20240110_000006_create_order_status_history_table::Migration),
            Box::new(m20240110_000007_create_inventory_tables::Migration),
            Box::new(m20240110_000008_create_invoices_table::Migration),
        ]
    }
}
