//! Domain services. Handlers stay thin: every rule lives here, and every
//! service method takes the caller's `business_id` explicitly so tenant
//! scoping is visible at each call site.

use sea_orm::TransactionError;
use std::sync::Arc;

use crate::{db::DbPool, errors::ServiceError, events::EventSender};

pub mod billing;
pub mod customers;
pub mod inventory;
pub mod order_numbers;
pub mod orders;
pub mod subscription;
pub mod workshop;

pub use billing::BillingService;
pub use customers::CustomerService;
pub use inventory::InventoryService;
pub use orders::OrderService;
pub use subscription::SubscriptionService;
pub use workshop::WorkshopService;

pub mod notifications;
pub use notifications::PushClient;

/// All services wired against one pool and one event channel.
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub workshop: WorkshopService,
    pub inventory: InventoryService,
    pub customers: CustomerService,
    pub subscription: SubscriptionService,
    pub billing: BillingService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, trial_period_days: i64) -> Self {
        Self {
            orders: OrderService::new(db.clone(), event_sender.clone()),
            workshop: WorkshopService::new(db.clone(), event_sender.clone()),
            inventory: InventoryService::new(db.clone(), event_sender.clone()),
            customers: CustomerService::new(db.clone()),
            subscription: SubscriptionService::new(
                db.clone(),
                event_sender.clone(),
                trial_period_days,
            ),
            billing: BillingService::new(db, event_sender),
        }
    }
}

/// Unwraps sea-orm's closure-transaction error wrapper back into our error.
pub(crate) fn map_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(e) => ServiceError::DatabaseError(e),
        TransactionError::Transaction(e) => e,
    }
}
