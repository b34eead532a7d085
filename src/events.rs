//! Domain events emitted by services after their transactions commit.
//!
//! Events are best-effort: a full channel or a missing consumer must never
//! fail the business operation that emitted the event. The processor forwards
//! a subset of events to the push relay, fire-and-forget.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::notifications::PushClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        business_id: Uuid,
        order_number: String,
    },
    OrderStatusChanged {
        order_id: Uuid,
        business_id: Uuid,
        old_status: String,
        new_status: String,
    },
    ItemsSentToWorkshop {
        order_id: Uuid,
        business_id: Uuid,
        item_count: usize,
        partner_name: String,
    },
    WorkshopItemUpdated {
        item_id: Uuid,
        order_id: Uuid,
        action: String,
    },
    StockAdjusted {
        item_id: Uuid,
        business_id: Uuid,
        previous_stock: i32,
        new_stock: i32,
    },
    LowStock {
        item_id: Uuid,
        business_id: Uuid,
        item_name: String,
        current_stock: i32,
        threshold: i32,
    },
    PaymentRecorded {
        order_id: Uuid,
        business_id: Uuid,
    },
    SubscriptionSuspended {
        business_id: Uuid,
    },
    InvoicePaid {
        invoice_id: Uuid,
        business_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging instead of failing when the channel is gone.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "Event channel closed; dropping event");
        }
    }
}

/// Consumes the event stream, logging each event and forwarding
/// notification-worthy ones to the push relay.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>, push: Option<Arc<PushClient>>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "Processing event");

        let Some(push) = push.as_ref() else { continue };
        match &event {
            Event::LowStock {
                business_id,
                item_name,
                current_stock,
                threshold,
                ..
            } => {
                push.notify(
                    *business_id,
                    "Low stock alert",
                    &format!(
                        "{} is down to {} (threshold {})",
                        item_name, current_stock, threshold
                    ),
                )
                .await;
            }
            Event::OrderStatusChanged {
                business_id,
                new_status,
                ..
            } if new_status == "ready" => {
                push.notify(*business_id, "Order ready", "An order is ready for delivery")
                    .await;
            }
            _ => {}
        }
    }
    info!("Event channel closed; processor exiting");
}
