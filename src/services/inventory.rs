use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::inventory_item::{
        self, ActiveModel as ItemActiveModel, Entity as ItemEntity, Model as ItemModel,
    },
    entities::inventory_restock_log::{
        self, ActiveModel as LogActiveModel, Entity as LogEntity, Model as LogModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::StockAdjustmentType,
};

use super::map_transaction_error;

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateInventoryItemInput {
    #[validate(length(min = 1, max = 120, message = "Item name is required"))]
    pub name: String,
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Unit is required"))]
    pub unit: String,
    #[validate(range(min = 0, message = "Initial stock cannot be negative"))]
    pub initial_stock: i32,
    #[validate(range(min = 0, message = "Low-stock threshold cannot be negative"))]
    pub low_stock_threshold: i32,
    pub cost_per_unit: Decimal,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateInventoryItemInput {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub unit: Option<String>,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
    pub cost_per_unit: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct AdjustStockInput {
    pub adjustment_type: StockAdjustmentType,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdjustStockResponse {
    pub item: ItemModel,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub low_stock: bool,
}

/// Consumable stock tracking. Every mutation of `current_stock` goes through
/// `adjust_stock`, which writes a restock-log row in the same transaction.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(business_id = %business_id))]
    pub async fn create_item(
        &self,
        business_id: Uuid,
        actor: &str,
        input: CreateInventoryItemInput,
    ) -> Result<ItemModel, ServiceError> {
        input.validate()?;

        if let Some(sku) = &input.sku {
            let existing = ItemEntity::find()
                .filter(inventory_item::Column::BusinessId.eq(business_id))
                .filter(inventory_item::Column::Sku.eq(sku.clone()))
                .one(&*self.db)
                .await?;
            if existing.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "An inventory item with SKU '{}' already exists",
                    sku
                )));
            }
        }

        let now = Utc::now();
        let item_id = Uuid::new_v4();
        let initial_stock = input.initial_stock;
        let actor = actor.to_string();
        let item_input = input;

        let item = self
            .db
            .transaction::<_, ItemModel, ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = ItemActiveModel {
                        id: Set(item_id),
                        business_id: Set(business_id),
                        name: Set(item_input.name),
                        sku: Set(item_input.sku),
                        unit: Set(item_input.unit),
                        current_stock: Set(initial_stock),
                        low_stock_threshold: Set(item_input.low_stock_threshold),
                        cost_per_unit: Set(item_input.cost_per_unit),
                        created_at: Set(now),
                        updated_at: Set(Some(now)),
                    }
                    .insert(txn)
                    .await?;

                    // Opening stock shows up in the log like any other addition.
                    if initial_stock > 0 {
                        LogActiveModel {
                            id: Set(Uuid::new_v4()),
                            inventory_item_id: Set(item_id),
                            business_id: Set(business_id),
                            adjustment_type: Set(StockAdjustmentType::Add.to_string()),
                            quantity: Set(initial_stock),
                            previous_stock: Set(0),
                            new_stock: Set(initial_stock),
                            cost: Set(None),
                            notes: Set(Some("Opening stock".to_string())),
                            created_by: Set(actor),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                    }

                    Ok(item)
                })
            })
            .await
            .map_err(map_transaction_error)?;

        info!(item_id = %item.id, "Inventory item created");
        Ok(item)
    }

    pub async fn get_item(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> Result<ItemModel, ServiceError> {
        self.find_owned(business_id, item_id).await
    }

    pub async fn list_items(
        &self,
        business_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ItemModel>, u64), ServiceError> {
        let paginator = ItemEntity::find()
            .filter(inventory_item::Column::BusinessId.eq(business_id))
            .order_by_asc(inventory_item::Column::Name)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Items at or below their configured low-stock threshold.
    pub async fn list_low_stock(&self, business_id: Uuid) -> Result<Vec<ItemModel>, ServiceError> {
        let items = ItemEntity::find()
            .filter(inventory_item::Column::BusinessId.eq(business_id))
            .all(&*self.db)
            .await?;
        Ok(items
            .into_iter()
            .filter(|i| i.current_stock <= i.low_stock_threshold)
            .collect())
    }

    pub async fn update_item(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        input: UpdateInventoryItemInput,
    ) -> Result<ItemModel, ServiceError> {
        input.validate()?;
        let item = self.find_owned(business_id, item_id).await?;

        let mut active: ItemActiveModel = item.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(threshold) = input.low_stock_threshold {
            active.low_stock_threshold = Set(threshold);
        }
        if let Some(cost) = input.cost_per_unit {
            active.cost_per_unit = Set(cost);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    /// Applies a signed adjustment with a hard zero floor: a removal larger
    /// than the current stock is rejected outright, never clamped. The
    /// restock-log row is written in the same transaction, so log and stock
    /// cannot drift.
    #[instrument(skip(self, input), fields(business_id = %business_id, item_id = %item_id))]
    pub async fn adjust_stock(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        actor: &str,
        input: AdjustStockInput,
    ) -> Result<AdjustStockResponse, ServiceError> {
        input.validate()?;

        let actor = actor.to_string();
        let adjustment_type = input.adjustment_type;
        let quantity = input.quantity;
        let cost = input.cost;
        let notes = input.notes;

        let (item, previous_stock) = self
            .db
            .transaction::<_, (ItemModel, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = ItemEntity::find_by_id(item_id)
                        .filter(inventory_item::Column::BusinessId.eq(business_id))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Inventory item not found".to_string())
                        })?;

                    let previous = item.current_stock;
                    let new_stock = match adjustment_type {
                        StockAdjustmentType::Add => previous + quantity,
                        StockAdjustmentType::Remove => {
                            if quantity > previous {
                                return Err(ServiceError::InsufficientStock(format!(
                                    "Cannot remove {} from '{}', only {} in stock",
                                    quantity, item.name, previous
                                )));
                            }
                            previous - quantity
                        }
                    };

                    let now = Utc::now();
                    let mut active: ItemActiveModel = item.into();
                    active.current_stock = Set(new_stock);
                    active.updated_at = Set(Some(now));
                    let updated = active.update(txn).await?;

                    LogActiveModel {
                        id: Set(Uuid::new_v4()),
                        inventory_item_id: Set(item_id),
                        business_id: Set(business_id),
                        adjustment_type: Set(adjustment_type.to_string()),
                        quantity: Set(quantity),
                        previous_stock: Set(previous),
                        new_stock: Set(new_stock),
                        cost: Set(cost),
                        notes: Set(notes),
                        created_by: Set(actor),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await?;

                    Ok((updated, previous))
                })
            })
            .await
            .map_err(map_transaction_error)?;

        let low_stock = item.current_stock <= item.low_stock_threshold;
        info!(
            item_id = %item_id,
            previous = previous_stock,
            new = item.current_stock,
            "Stock adjusted"
        );

        self.event_sender
            .send(Event::StockAdjusted {
                item_id,
                business_id,
                previous_stock,
                new_stock: item.current_stock,
            })
            .await;

        if low_stock {
            warn!(item_id = %item_id, stock = item.current_stock, "Item at or below low-stock threshold");
            self.event_sender
                .send(Event::LowStock {
                    item_id,
                    business_id,
                    item_name: item.name.clone(),
                    current_stock: item.current_stock,
                    threshold: item.low_stock_threshold,
                })
                .await;
        }

        Ok(AdjustStockResponse {
            previous_stock,
            new_stock: item.current_stock,
            low_stock,
            item,
        })
    }

    /// The adjustment audit trail for one item, newest first.
    pub async fn get_restock_log(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> Result<Vec<LogModel>, ServiceError> {
        self.find_owned(business_id, item_id).await?;
        let rows = LogEntity::find()
            .filter(inventory_restock_log::Column::InventoryItemId.eq(item_id))
            .order_by_desc(inventory_restock_log::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    async fn find_owned(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> Result<ItemModel, ServiceError> {
        ItemEntity::find_by_id(item_id)
            .filter(inventory_item::Column::BusinessId.eq(business_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Inventory item not found".to_string()))
    }
}
