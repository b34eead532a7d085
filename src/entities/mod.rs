pub mod business;
pub mod customer;
pub mod inventory_item;
pub mod inventory_restock_log;
pub mod invoice;
pub mod order;
pub mod order_item;
pub mod order_status_history;
pub mod store;
