//! Shared harness: in-memory SQLite, migrations, seeded tenant data, and
//! fully wired services.

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use washtrack_api::{
    db::{self, DbPool},
    entities::{business, customer, inventory_item, invoice, store},
    events::{Event, EventSender},
    services::AppServices,
};

pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub events: mpsc::Receiver<Event>,
    pub business_id: Uuid,
    pub store_id: Uuid,
    pub customer_id: Uuid,
}

pub async fn spawn_app() -> TestApp {
    let pool = db::establish_connection("sqlite::memory:")
        .await
        .expect("sqlite connection");
    db::run_migrations(&pool).await.expect("migrations");
    let db = Arc::new(pool);

    let (tx, rx) = mpsc::channel(256);
    let event_sender = EventSender::new(tx);
    let services = AppServices::new(db.clone(), event_sender, 14);

    let business_id = seed_business(&db, "Sparkle Laundry").await;
    let store_id = seed_store(&db, business_id, "Koramangala Main").await;
    let customer_id = seed_customer(&db, business_id, "Asha Rao", "9876543210").await;

    TestApp {
        db,
        services,
        events: rx,
        business_id,
        store_id,
        customer_id,
    }
}

pub async fn seed_business(db: &DbPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    business::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(None),
        phone: Set(None),
        plan_type: Set("premium".to_string()),
        plan_status: Set("active".to_string()),
        trial_ends_at: Set(None),
        subscription_ends_at: Set(Some(Utc::now() + Duration::days(90))),
        gst_enabled: Set(true),
        gst_percentage: Set(dec!(18)),
        express_multiplier: Set(dec!(1.5)),
        low_stock_push: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed business");
    id
}

pub async fn seed_trial_business(
    db: &DbPool,
    name: &str,
    trial_ends_at: Option<chrono::DateTime<Utc>>,
) -> Uuid {
    let id = Uuid::new_v4();
    business::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(None),
        phone: Set(None),
        plan_type: Set("trial".to_string()),
        plan_status: Set("active".to_string()),
        trial_ends_at: Set(trial_ends_at),
        subscription_ends_at: Set(None),
        gst_enabled: Set(false),
        gst_percentage: Set(dec!(0)),
        express_multiplier: Set(dec!(1)),
        low_stock_push: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed trial business");
    id
}

pub async fn seed_store(db: &DbPool, business_id: Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    store::ActiveModel {
        id: Set(id),
        business_id: Set(business_id),
        name: Set(name.to_string()),
        address: Set(None),
        phone: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed store");
    id
}

pub async fn seed_customer(db: &DbPool, business_id: Uuid, name: &str, phone: &str) -> Uuid {
    let id = Uuid::new_v4();
    customer::ActiveModel {
        id: Set(id),
        business_id: Set(business_id),
        name: Set(name.to_string()),
        phone: Set(phone.to_string()),
        email: Set(None),
        address: Set(None),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed customer");
    id
}

pub async fn seed_inventory_item(
    db: &DbPool,
    business_id: Uuid,
    name: &str,
    stock: i32,
    threshold: i32,
) -> Uuid {
    let id = Uuid::new_v4();
    inventory_item::ActiveModel {
        id: Set(id),
        business_id: Set(business_id),
        name: Set(name.to_string()),
        sku: Set(None),
        unit: Set("kg".to_string()),
        current_stock: Set(stock),
        low_stock_threshold: Set(threshold),
        cost_per_unit: Set(dec!(120)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed inventory item");
    id
}

pub async fn seed_invoice(
    db: &DbPool,
    business_id: Uuid,
    gateway_order_id: &str,
    period_months: i32,
) -> Uuid {
    let id = Uuid::new_v4();
    invoice::ActiveModel {
        id: Set(id),
        business_id: Set(business_id),
        gateway_order_id: Set(gateway_order_id.to_string()),
        gateway_payment_id: Set(None),
        amount: Set(dec!(999)),
        currency: Set("INR".to_string()),
        status: Set("created".to_string()),
        plan_type: Set("premium".to_string()),
        period_months: Set(period_months),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed invoice");
    id
}
