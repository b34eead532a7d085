use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        business::Entity as BusinessEntity,
        customer::{self, Entity as CustomerEntity},
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
        order_item::{self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity},
        order_status_history::{
            self, ActiveModel as HistoryActiveModel, Entity as HistoryEntity,
            Model as HistoryModel,
        },
        store::{self, Entity as StoreEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderChannel, OrderStatus, PaymentStatus},
    services::order_numbers,
};

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateOrderInput {
    pub store_id: Uuid,
    pub customer_id: Uuid,
    pub channel: OrderChannel,
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    pub items: Vec<CreateOrderItemInput>,
    pub discount: Option<Decimal>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateOrderItemInput {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    pub service_type: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub is_express: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub business_id: Uuid,
    pub store_id: Uuid,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub gst_enabled: bool,
    pub gst_percentage: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub payment_status: String,
    pub pickup_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for the order lifecycle: intake, status transitions, payments.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an order with its items and the initial history row in one
    /// transaction, retrying the whole creation when the generated order
    /// number collides with a concurrent creator.
    #[instrument(skip(self, input), fields(business_id = %business_id, store_id = %input.store_id))]
    pub async fn create_order(
        &self,
        business_id: Uuid,
        actor: &str,
        input: CreateOrderInput,
    ) -> Result<OrderResponse, ServiceError> {
        input.validate()?;
        for item in &input.items {
            item.validate()?;
        }

        let db = &*self.db;

        let business = BusinessEntity::find_by_id(business_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Business not found".to_string()))?;

        let store = StoreEntity::find_by_id(input.store_id)
            .filter(store::Column::BusinessId.eq(business_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Store not found".to_string()))?;

        CustomerEntity::find_by_id(input.customer_id)
            .filter(customer::Column::BusinessId.eq(business_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        // Pricing
        let mut subtotal = Decimal::ZERO;
        let mut priced_items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let multiplier = if item.is_express {
                business.express_multiplier
            } else {
                Decimal::ONE
            };
            let line_subtotal =
                (item.unit_price * Decimal::from(item.quantity) * multiplier).round_dp(2);
            subtotal += line_subtotal;
            priced_items.push((item, line_subtotal));
        }

        let discount = input.discount.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO || discount > subtotal {
            return Err(ServiceError::ValidationError(format!(
                "Discount {} must be between 0 and the subtotal {}",
                discount, subtotal
            )));
        }

        let gst_amount = if business.gst_enabled {
            ((subtotal - discount) * business.gst_percentage / Decimal::from(100)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        let total_amount = subtotal - discount + gst_amount;
        let initial_status = input.channel.initial_status();

        // Order-number collision retry: regenerate and re-run the whole
        // insert, but only for uniqueness violations.
        let mut attempt = 0;
        loop {
            attempt += 1;

            let order_number = order_numbers::next_order_number(
                db,
                business_id,
                &store.name,
                Utc::now().date_naive(),
            )
            .await?;

            match self
                .insert_order(
                    business_id,
                    &business.gst_enabled,
                    business.gst_percentage,
                    &input,
                    &priced_items,
                    &order_number,
                    initial_status,
                    subtotal,
                    discount,
                    gst_amount,
                    total_amount,
                    actor,
                )
                .await
            {
                Ok(order) => {
                    info!(order_id = %order.id, order_number = %order.order_number, "Order created");
                    self.event_sender
                        .send(Event::OrderCreated {
                            order_id: order.id,
                            business_id,
                            order_number: order.order_number.clone(),
                        })
                        .await;
                    return Ok(model_to_response(order));
                }
                Err(ServiceError::DatabaseError(e))
                    if order_numbers::is_order_number_collision(&e)
                        && attempt < order_numbers::MAX_ATTEMPTS =>
                {
                    warn!(
                        order_number = %order_number,
                        attempt = attempt,
                        "Order number collision; regenerating"
                    );
                    tokio::time::sleep(order_numbers::backoff(attempt)).await;
                }
                Err(ServiceError::DatabaseError(e)) if order_numbers::is_order_number_collision(&e) => {
                    error!(attempts = attempt, "Order number retries exhausted");
                    return Err(ServiceError::Conflict(
                        "Failed to generate a unique order number, please try again".to_string(),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_order(
        &self,
        business_id: Uuid,
        gst_enabled: &bool,
        gst_percentage: Decimal,
        input: &CreateOrderInput,
        priced_items: &[(&CreateOrderItemInput, Decimal)],
        order_number: &str,
        initial_status: OrderStatus,
        subtotal: Decimal,
        discount: Decimal,
        gst_amount: Decimal,
        total_amount: Decimal,
        actor: &str,
    ) -> Result<OrderModel, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let order = OrderActiveModel {
            id: Set(order_id),
            business_id: Set(business_id),
            store_id: Set(input.store_id),
            customer_id: Set(input.customer_id),
            driver_id: Set(None),
            order_number: Set(order_number.to_string()),
            status: Set(initial_status.to_string()),
            subtotal: Set(subtotal),
            discount: Set(discount),
            gst_enabled: Set(*gst_enabled),
            gst_percentage: Set(gst_percentage),
            gst_amount: Set(gst_amount),
            total_amount: Set(total_amount),
            paid_amount: Set(Decimal::ZERO),
            payment_status: Set(PaymentStatus::Unpaid.to_string()),
            pickup_date: Set(input.pickup_date),
            delivery_date: Set(input.delivery_date),
            picked_up_at: Set(None),
            delivered_at: Set(None),
            notes: Set(input.notes.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        }
        .insert(&txn)
        .await?;

        for (seq, (item, line_subtotal)) in priced_items.iter().enumerate() {
            OrderItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                business_id: Set(business_id),
                tag_number: Set(format!("{}-{:02}", order_number, seq + 1)),
                name: Set(item.name.clone()),
                service_type: Set(item.service_type.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                is_express: Set(item.is_express),
                subtotal: Set(*line_subtotal),
                status: Set(crate::models::OrderItemStatus::Received.to_string()),
                sent_to_workshop: Set(false),
                workshop_partner_name: Set(None),
                workshop_sent_date: Set(None),
                workshop_returned_date: Set(None),
                workshop_notes: Set(None),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            }
            .insert(&txn)
            .await?;
        }

        append_history(
            &txn,
            order_id,
            initial_status,
            initial_status,
            actor,
            Some("Order created".to_string()),
        )
        .await?;

        txn.commit().await?;
        Ok(order)
    }

    #[instrument(skip(self), fields(business_id = %business_id, order_id = %order_id))]
    pub async fn get_order(
        &self,
        business_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let order = self.find_owned(business_id, order_id).await?;
        Ok(model_to_response(order))
    }

    pub async fn get_order_by_number(
        &self,
        business_id: Uuid,
        order_number: &str,
    ) -> Result<OrderResponse, ServiceError> {
        let order = OrderEntity::find()
            .filter(order::Column::BusinessId.eq(business_id))
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with number {} not found", order_number))
            })?;
        Ok(model_to_response(order))
    }

    pub async fn get_order_items(
        &self,
        business_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        self.find_owned(business_id, order_id).await?;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::TagNumber)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        business_id: Uuid,
        page: u64,
        per_page: u64,
        status: Option<OrderStatus>,
    ) -> Result<OrderListResponse, ServiceError> {
        let mut query = OrderEntity::find().filter(order::Column::BusinessId.eq(business_id));
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status.to_string()));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(OrderListResponse {
            orders: orders.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Updates the aggregate status, enforcing the order state machine and
    /// appending a history row in the same transaction. Milestone timestamps
    /// (`picked_up_at`, `delivered_at`) are stamped on the transitions that
    /// represent them.
    #[instrument(skip(self, notes), fields(business_id = %business_id, order_id = %order_id, new_status = %new_status))]
    pub async fn update_order_status(
        &self,
        business_id: Uuid,
        order_id: Uuid,
        new_status: OrderStatus,
        actor: &str,
        notes: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = OrderEntity::find_by_id(order_id)
            .filter(order::Column::BusinessId.eq(business_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let old_status = parse_order_status(&order.status)?;

        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot transition order from '{}' to '{}'",
                old_status, new_status
            )));
        }

        if old_status == new_status {
            return Ok(model_to_response(order));
        }

        let now = Utc::now();
        let version = order.version;
        let picked_up_at = order.picked_up_at;
        let delivered_at = order.delivered_at;

        let mut active: OrderActiveModel = order.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);

        if old_status == OrderStatus::Pickup
            && new_status == OrderStatus::InProgress
            && picked_up_at.is_none()
        {
            active.picked_up_at = Set(Some(now));
        }
        if new_status == OrderStatus::Completed && delivered_at.is_none() {
            active.delivered_at = Set(Some(now));
        }

        let updated = active.update(&txn).await?;
        append_history(&txn, order_id, old_status, new_status, actor, notes).await?;
        txn.commit().await?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %new_status,
            "Order status updated"
        );

        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                business_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        Ok(model_to_response(updated))
    }

    /// Cancels an order. Cancellation is a status value, never a deletion.
    pub async fn cancel_order(
        &self,
        business_id: Uuid,
        order_id: Uuid,
        actor: &str,
        reason: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        self.update_order_status(business_id, order_id, OrderStatus::Cancelled, actor, reason)
            .await
    }

    /// Records an additive payment and re-derives the payment status. The
    /// paid amount can never exceed the total, so the due amount stays
    /// non-negative.
    #[instrument(skip(self), fields(business_id = %business_id, order_id = %order_id, amount = %amount))]
    pub async fn record_payment(
        &self,
        business_id: Uuid,
        order_id: Uuid,
        amount: Decimal,
    ) -> Result<OrderResponse, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let order = OrderEntity::find_by_id(order_id)
            .filter(order::Column::BusinessId.eq(business_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let due = order.total_amount - order.paid_amount;
        if amount > due {
            return Err(ServiceError::ValidationError(format!(
                "Payment of {} exceeds the due amount {}",
                amount, due
            )));
        }

        let new_paid = order.paid_amount + amount;
        let total = order.total_amount;
        let version = order.version;

        let mut active: OrderActiveModel = order.into();
        active.paid_amount = Set(new_paid);
        active.payment_status = Set(derive_payment_status(new_paid, total).to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send(Event::PaymentRecorded {
                order_id,
                business_id,
            })
            .await;

        Ok(model_to_response(updated))
    }

    pub async fn assign_driver(
        &self,
        business_id: Uuid,
        order_id: Uuid,
        driver_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let order = self.find_owned(business_id, order_id).await?;
        let version = order.version;

        let mut active: OrderActiveModel = order.into();
        active.driver_id = Set(Some(driver_id));
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);

        let updated = active.update(&*self.db).await?;
        Ok(model_to_response(updated))
    }

    /// Returns the append-only transition log, oldest first.
    pub async fn get_status_history(
        &self,
        business_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<HistoryModel>, ServiceError> {
        self.find_owned(business_id, order_id).await?;
        let rows = HistoryEntity::find()
            .filter(order_status_history::Column::OrderId.eq(order_id))
            .order_by_asc(order_status_history::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    async fn find_owned(
        &self,
        business_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderModel, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .filter(order::Column::BusinessId.eq(business_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }
}

/// Appends an audit row inside the caller's transaction.
pub(crate) async fn append_history(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
    actor: &str,
    notes: Option<String>,
) -> Result<(), ServiceError> {
    HistoryActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        from_status: Set(from.to_string()),
        to_status: Set(to.to_string()),
        changed_by: Set(actor.to_string()),
        notes: Set(notes),
        created_at: Set(Utc::now()),
    }
    .insert(txn)
    .await?;
    Ok(())
}

pub(crate) fn parse_order_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw)
        .map_err(|_| ServiceError::InternalError(format!("Unknown order status '{}'", raw)))
}

pub(crate) fn derive_payment_status(paid: Decimal, total: Decimal) -> PaymentStatus {
    if paid >= total && total > Decimal::ZERO {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    }
}

fn model_to_response(model: OrderModel) -> OrderResponse {
    let due_amount = model.total_amount - model.paid_amount;
    OrderResponse {
        id: model.id,
        order_number: model.order_number,
        business_id: model.business_id,
        store_id: model.store_id,
        customer_id: model.customer_id,
        driver_id: model.driver_id,
        status: OrderStatus::from_str(&model.status).unwrap_or(OrderStatus::Pickup),
        subtotal: model.subtotal,
        discount: model.discount,
        gst_enabled: model.gst_enabled,
        gst_percentage: model.gst_percentage,
        gst_amount: model.gst_amount,
        total_amount: model.total_amount,
        paid_amount: model.paid_amount,
        due_amount,
        payment_status: model.payment_status,
        pickup_date: model.pickup_date,
        delivery_date: model.delivery_date,
        picked_up_at: model.picked_up_at,
        delivered_at: model.delivered_at,
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn payment_status_derivation() {
        assert_eq!(
            derive_payment_status(dec!(0), dec!(100)),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            derive_payment_status(dec!(40), dec!(100)),
            PaymentStatus::Partial
        );
        assert_eq!(
            derive_payment_status(dec!(100), dec!(100)),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn unknown_status_string_is_an_internal_error() {
        assert!(parse_order_status("definitely_not_a_status").is_err());
        assert_eq!(
            parse_order_status("out_for_delivery").unwrap(),
            OrderStatus::OutForDelivery
        );
    }
}
