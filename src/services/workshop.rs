use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity},
        order_item::{self, ActiveModel as ItemActiveModel, Entity as ItemEntity, Model as ItemModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderItemStatus, OrderStatus, WorkshopAction},
    services::orders::{append_history, parse_order_status},
};

use super::map_transaction_error;

/// Partner used when the caller does not name one.
const DEFAULT_PARTNER: &str = "External Workshop";

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SendToWorkshopInput {
    #[validate(length(min = 1, message = "Select at least one item"))]
    pub item_ids: Vec<Uuid>,
    #[validate(length(min = 1, max = 120, message = "Workshop partner name cannot be blank"))]
    pub partner_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WorkshopBatchResponse {
    pub order_id: Uuid,
    pub sent_count: usize,
    pub skipped: Vec<SkippedItem>,
    pub order_status: OrderStatus,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SkippedItem {
    pub item_id: Uuid,
    pub tag_number: String,
    pub reason: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct WorkshopItemUpdateInput {
    pub action: WorkshopAction,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkshopItemResponse {
    pub item: ItemModel,
    pub order_status: OrderStatus,
    pub order_auto_advanced: bool,
}

/// Routes items to third-party workshop partners and reconciles the parent
/// order's status as items move.
#[derive(Clone)]
pub struct WorkshopService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl WorkshopService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Sends a batch of items to a workshop partner. The batch is
    /// partial-success: ineligible items are skipped with a per-item reason
    /// rather than failing the batch, and only an entirely ineligible batch
    /// is an error. If every item of the order ends up at the workshop, the
    /// order itself moves to `at_workshop` in the same transaction.
    #[instrument(skip(self, input), fields(business_id = %business_id, order_id = %order_id))]
    pub async fn send_items_to_workshop(
        &self,
        business_id: Uuid,
        order_id: Uuid,
        actor: &str,
        input: SendToWorkshopInput,
    ) -> Result<WorkshopBatchResponse, ServiceError> {
        input.validate()?;

        let order = OrderEntity::find_by_id(order_id)
            .filter(order::Column::BusinessId.eq(business_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let order_status = parse_order_status(&order.status)?;
        if !matches!(order_status, OrderStatus::InProgress | OrderStatus::Ready) {
            return Err(ServiceError::InvalidStatus(format!(
                "Items can only be sent to a workshop while the order is in progress or ready, not '{}'",
                order_status
            )));
        }

        let items = ItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        // Pre-filter outside the transaction: collect the eligible subset and
        // a reason per skipped item.
        let mut eligible: Vec<ItemModel> = Vec::new();
        let mut skipped: Vec<SkippedItem> = Vec::new();
        for item_id in &input.item_ids {
            let Some(item) = items.iter().find(|i| i.id == *item_id) else {
                skipped.push(SkippedItem {
                    item_id: *item_id,
                    tag_number: String::new(),
                    reason: "Item does not belong to this order".to_string(),
                });
                continue;
            };
            if item.sent_to_workshop {
                skipped.push(SkippedItem {
                    item_id: item.id,
                    tag_number: item.tag_number.clone(),
                    reason: format!(
                        "Already at workshop '{}'",
                        item.workshop_partner_name.as_deref().unwrap_or("unknown")
                    ),
                });
                continue;
            }
            let status = parse_item_status(&item.status)?;
            if !status.workshop_eligible() {
                skipped.push(SkippedItem {
                    item_id: item.id,
                    tag_number: item.tag_number.clone(),
                    reason: format!("Status '{}' is not eligible for workshop routing", status),
                });
                continue;
            }
            eligible.push(item.clone());
        }

        if eligible.is_empty() {
            let reasons = skipped
                .iter()
                .map(|s| {
                    if s.tag_number.is_empty() {
                        s.reason.clone()
                    } else {
                        format!("{}: {}", s.tag_number, s.reason)
                    }
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ServiceError::ValidationError(format!(
                "No items in the batch are eligible for the workshop ({})",
                reasons
            )));
        }

        let partner = input
            .partner_name
            .unwrap_or_else(|| DEFAULT_PARTNER.to_string());
        let partner_for_event = partner.clone();
        let batch_notes = input.notes.clone();
        let eligible_ids: Vec<Uuid> = eligible.iter().map(|i| i.id).collect();
        let all_item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let actor = actor.to_string();

        let final_status = self
            .db
            .transaction::<_, OrderStatus, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    for item in eligible {
                        let mut active: ItemActiveModel = item.into();
                        active.sent_to_workshop = Set(true);
                        active.status = Set(OrderItemStatus::AtWorkshop.to_string());
                        active.workshop_partner_name = Set(Some(partner.clone()));
                        active.workshop_sent_date = Set(Some(now));
                        active.workshop_returned_date = Set(None);
                        active.workshop_notes = Set(batch_notes.clone());
                        active.updated_at = Set(Some(now));
                        active.update(txn).await?;
                    }

                    reconcile_order_status(txn, order_id, &all_item_ids, &actor).await
                })
            })
            .await
            .map_err(map_transaction_error)?;

        if !skipped.is_empty() {
            warn!(
                order_id = %order_id,
                skipped = skipped.len(),
                "Workshop batch partially applied"
            );
        }
        info!(order_id = %order_id, sent = eligible_ids.len(), "Items sent to workshop");

        self.event_sender
            .send(Event::ItemsSentToWorkshop {
                order_id,
                business_id,
                item_count: eligible_ids.len(),
                partner_name: partner_for_event,
            })
            .await;

        Ok(WorkshopBatchResponse {
            order_id,
            sent_count: eligible_ids.len(),
            skipped,
            order_status: final_status,
        })
    }

    /// Applies one workshop action to one item and reconciles the parent
    /// order in the same transaction. When the last pending item becomes
    /// ready, the order auto-advances to `ready` with an audit note.
    #[instrument(skip(self, input), fields(business_id = %business_id, item_id = %item_id))]
    pub async fn update_workshop_item(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        actor: &str,
        input: WorkshopItemUpdateInput,
    ) -> Result<WorkshopItemResponse, ServiceError> {
        let item = ItemEntity::find_by_id(item_id)
            .filter(order_item::Column::BusinessId.eq(business_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order item not found".to_string()))?;

        let status = parse_item_status(&item.status)?;
        match input.action {
            WorkshopAction::MarkReturned => {
                if status != OrderItemStatus::AtWorkshop {
                    return Err(ServiceError::InvalidStatus(format!(
                        "Item '{}' must be at a workshop to be marked returned, not '{}'",
                        item.tag_number, status
                    )));
                }
            }
            WorkshopAction::MarkReady => {
                if status != OrderItemStatus::WorkshopReturned {
                    return Err(ServiceError::InvalidStatus(format!(
                        "Item '{}' must be returned from the workshop before it can pass QC, not '{}'",
                        item.tag_number, status
                    )));
                }
            }
            WorkshopAction::ReturnToStore => {
                if !matches!(
                    status,
                    OrderItemStatus::AtWorkshop | OrderItemStatus::WorkshopReturned
                ) {
                    return Err(ServiceError::InvalidStatus(format!(
                        "Item '{}' must be at or returned from a workshop to go back to the store, not '{}'",
                        item.tag_number, status
                    )));
                }
            }
        }

        let order_id = item.order_id;
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
        let old_order_status = parse_order_status(&order.status)?;

        let action = input.action;
        let notes = input.notes.clone();
        let actor_owned = actor.to_string();

        let (updated_item, new_order_status) = self
            .db
            .transaction::<_, (ItemModel, OrderStatus), ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let has_returned_date = item.workshop_returned_date.is_some();
                    let mut active: ItemActiveModel = item.into();
                    match action {
                        WorkshopAction::MarkReturned => {
                            active.status = Set(OrderItemStatus::WorkshopReturned.to_string());
                            active.sent_to_workshop = Set(false);
                            active.workshop_returned_date = Set(Some(now));
                        }
                        WorkshopAction::MarkReady => {
                            active.status = Set(OrderItemStatus::Ready.to_string());
                        }
                        WorkshopAction::ReturnToStore => {
                            active.status = Set(OrderItemStatus::Ready.to_string());
                            active.sent_to_workshop = Set(false);
                            // Keep the date stamped by mark_returned; stamp now
                            // when the item skips that step.
                            if !has_returned_date {
                                active.workshop_returned_date = Set(Some(now));
                            }
                        }
                    }
                    if let Some(notes) = notes {
                        active.workshop_notes = Set(Some(notes));
                    }
                    active.updated_at = Set(Some(now));
                    let updated = active.update(txn).await?;

                    let siblings = ItemEntity::find()
                        .filter(order_item::Column::OrderId.eq(order_id))
                        .all(txn)
                        .await?;
                    let sibling_ids: Vec<Uuid> = siblings.iter().map(|i| i.id).collect();

                    let status =
                        reconcile_order_status(txn, order_id, &sibling_ids, &actor_owned).await?;

                    Ok((updated, status))
                })
            })
            .await
            .map_err(map_transaction_error)?;

        let auto_advanced = new_order_status != old_order_status;
        if auto_advanced {
            info!(
                order_id = %order_id,
                new_status = %new_order_status,
                "Order status reconciled from item statuses"
            );
        }

        self.event_sender
            .send(Event::WorkshopItemUpdated {
                item_id,
                order_id,
                action: action.to_string(),
            })
            .await;

        if auto_advanced {
            self.event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    business_id,
                    old_status: old_order_status.to_string(),
                    new_status: new_order_status.to_string(),
                })
                .await;
        }

        Ok(WorkshopItemResponse {
            item: updated_item,
            order_status: new_order_status,
            order_auto_advanced: auto_advanced,
        })
    }

    /// Items currently out at workshop partners, for the business dashboard.
    pub async fn list_items_at_workshop(
        &self,
        business_id: Uuid,
    ) -> Result<Vec<ItemModel>, ServiceError> {
        let items = ItemEntity::find()
            .filter(order_item::Column::BusinessId.eq(business_id))
            .filter(order_item::Column::SentToWorkshop.eq(true))
            .all(&*self.db)
            .await?;
        Ok(items)
    }
}

/// Re-derives the order's status from its items and appends a history row if
/// it changed. Order status is a function of item statuses:
/// every item at workshop => `at_workshop`; every item done => `ready`;
/// otherwise a workshop-parked order falls back to `in_progress`.
async fn reconcile_order_status(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    item_ids: &[Uuid],
    actor: &str,
) -> Result<OrderStatus, ServiceError> {
    let order = OrderEntity::find_by_id(order_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
    let current = parse_order_status(&order.status)?;

    // Terminal orders and orders already out the door are never reconciled.
    if !matches!(
        current,
        OrderStatus::InProgress | OrderStatus::AtWorkshop | OrderStatus::Ready
    ) {
        return Ok(current);
    }

    let items = ItemEntity::find()
        .filter(order_item::Column::Id.is_in(item_ids.to_vec()))
        .all(txn)
        .await?;
    if items.is_empty() {
        return Ok(current);
    }

    let all_at_workshop = items.iter().all(|i| {
        parse_item_status(&i.status)
            .map(|s| s == OrderItemStatus::AtWorkshop)
            .unwrap_or(false)
    });
    let all_done = items.iter().all(|i| {
        parse_item_status(&i.status)
            .map(|s| s.is_done())
            .unwrap_or(false)
    });

    let target = if all_done {
        OrderStatus::Ready
    } else if all_at_workshop {
        OrderStatus::AtWorkshop
    } else if current == OrderStatus::AtWorkshop {
        OrderStatus::InProgress
    } else {
        current
    };

    if target == current || !current.can_transition_to(target) {
        return Ok(current);
    }

    let note = match target {
        OrderStatus::Ready => "Auto-updated: All items are ready",
        OrderStatus::AtWorkshop => "Auto-updated: All items are at workshop",
        _ => "Auto-updated: Item returned from workshop",
    };

    let version = order.version;
    let mut active: OrderActiveModel = order.into();
    active.status = Set(target.to_string());
    active.updated_at = Set(Some(Utc::now()));
    active.version = Set(version + 1);
    active.update(txn).await?;

    append_history(txn, order_id, current, target, actor, Some(note.to_string())).await?;

    Ok(target)
}

fn parse_item_status(raw: &str) -> Result<OrderItemStatus, ServiceError> {
    OrderItemStatus::from_str(raw)
        .map_err(|_| ServiceError::InternalError(format!("Unknown item status '{}'", raw)))
}

