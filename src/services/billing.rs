use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        business::{ActiveModel as BusinessActiveModel, Entity as BusinessEntity},
        invoice::{self, ActiveModel as InvoiceActiveModel, Entity as InvoiceEntity, Model as InvoiceModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{InvoiceStatus, PlanStatus},
};

use super::map_transaction_error;

/// Outcome of applying one gateway event, echoed back in the webhook ack.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied,
    /// Invoice already in a terminal status; the event was a replay.
    AlreadyProcessed,
    /// Event type we do not react to; acknowledged so the gateway stops
    /// retrying.
    Ignored,
}

/// Applies payment-gateway events to invoices and the owning business's
/// subscription. Replayed events are absorbed by the invoice's terminal-status
/// check, keyed by the gateway order id.
#[derive(Clone)]
pub struct BillingService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl BillingService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self), fields(event_type = %event_type, gateway_order_id = %gateway_order_id))]
    pub async fn apply_gateway_event(
        &self,
        event_type: &str,
        gateway_order_id: &str,
        gateway_payment_id: Option<String>,
    ) -> Result<WebhookOutcome, ServiceError> {
        let target_status = match event_type {
            "payment.captured" | "order.paid" => InvoiceStatus::Paid,
            "payment.failed" => InvoiceStatus::Failed,
            "refund.created" => InvoiceStatus::Refunded,
            other => {
                info!(event_type = %other, "Ignoring unhandled gateway event");
                return Ok(WebhookOutcome::Ignored);
            }
        };

        let invoice = InvoiceEntity::find()
            .filter(invoice::Column::GatewayOrderId.eq(gateway_order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No invoice for gateway order '{}'",
                    gateway_order_id
                ))
            })?;

        let current = InvoiceStatus::from_str(&invoice.status).map_err(|_| {
            ServiceError::InternalError(format!("Unknown invoice status '{}'", invoice.status))
        })?;
        if current.is_terminal() {
            info!(invoice_id = %invoice.id, status = %current, "Replayed gateway event ignored");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let business_id = invoice.business_id;
        let invoice_id = invoice.id;
        let period_months = invoice.period_months;
        let plan_type = invoice.plan_type.clone();
        let sender = self.event_sender.clone();

        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let mut active: InvoiceActiveModel = invoice.into();
                    active.status = Set(target_status.to_string());
                    active.gateway_payment_id = Set(gateway_payment_id);
                    active.updated_at = Set(Some(now));
                    active.update(txn).await?;

                    if target_status == InvoiceStatus::Paid {
                        let business = BusinessEntity::find_by_id(business_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::NotFound("Business not found".to_string())
                            })?;

                        // Extend from the current end when still in the
                        // future, otherwise from now.
                        let base = business
                            .subscription_ends_at
                            .filter(|ends| *ends > now)
                            .unwrap_or(now);
                        let new_end = base + Duration::days(30 * i64::from(period_months));

                        let mut active: BusinessActiveModel = business.into();
                        active.plan_type = Set(plan_type);
                        active.plan_status = Set(PlanStatus::Active.to_string());
                        active.subscription_ends_at = Set(Some(new_end));
                        active.updated_at = Set(Some(now));
                        active.update(txn).await?;
                    }

                    Ok(())
                })
            })
            .await
            .map_err(map_transaction_error)?;

        match target_status {
            InvoiceStatus::Paid => {
                info!(invoice_id = %invoice_id, "Invoice paid, subscription extended");
                sender
                    .send(Event::InvoicePaid {
                        invoice_id,
                        business_id,
                    })
                    .await;
            }
            other => {
                warn!(invoice_id = %invoice_id, status = %other, "Invoice marked {}", other);
            }
        }

        Ok(WebhookOutcome::Applied)
    }

    pub async fn list_invoices(
        &self,
        business_id: Uuid,
    ) -> Result<Vec<InvoiceModel>, ServiceError> {
        let invoices = InvoiceEntity::find()
            .filter(invoice::Column::BusinessId.eq(business_id))
            .all(&*self.db)
            .await?;
        Ok(invoices)
    }
}
