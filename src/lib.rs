//! WashTrack API Library
//!
//! Multi-tenant laundry operations backend: order lifecycle, workshop
//! routing, inventory, customers, and subscription billing.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DbPool>,
        config: Arc<config::AppConfig>,
        event_sender: events::EventSender,
    ) -> Self {
        let services = services::AppServices::new(
            db.clone(),
            event_sender.clone(),
            config.trial_period_days,
        );
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Common query parameters for list endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
    pub status: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

impl ListQuery {
    /// Page is 1-based; limit is capped so one request cannot drag the
    /// whole table over the wire.
    pub fn normalized(&self) -> (u64, u64) {
        (self.page.max(1), self.limit.clamp(1, 100))
    }
}

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// `/api/v1` routes. Business routes sit behind the subscription guard;
/// `/billing/*` and the status probes stay outside it so a lapsed tenant can
/// still see why they are locked out and the gateway can still deliver
/// webhooks.
pub fn api_v1_routes(state: AppState) -> Router<AppState> {
    use axum::routing::{post, put};

    let orders = Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/by-number/:order_number",
            get(handlers::orders::get_order_by_number),
        )
        .route("/orders/:id/items", get(handlers::orders::get_order_items))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route(
            "/orders/:id/payments",
            post(handlers::orders::record_payment),
        )
        .route(
            "/orders/:id/assign-driver",
            post(handlers::orders::assign_driver),
        )
        .route(
            "/orders/:id/history",
            get(handlers::orders::get_status_history),
        )
        .route(
            "/orders/:id/workshop",
            post(handlers::workshop::send_items_to_workshop),
        )
        .route(
            "/order-items/:id/workshop",
            put(handlers::workshop::update_workshop_item),
        )
        .route(
            "/workshop/items",
            get(handlers::workshop::list_items_at_workshop),
        );

    let inventory = Router::new()
        .route(
            "/inventory",
            post(handlers::inventory::create_item).get(handlers::inventory::list_items),
        )
        .route(
            "/inventory/low-stock",
            get(handlers::inventory::list_low_stock),
        )
        .route(
            "/inventory/:id",
            get(handlers::inventory::get_item).put(handlers::inventory::update_item),
        )
        .route(
            "/inventory/:id/adjust",
            post(handlers::inventory::adjust_stock),
        )
        .route(
            "/inventory/:id/restock-log",
            get(handlers::inventory::get_restock_log),
        );

    let customers = Router::new()
        .route(
            "/customers",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/customers/:id",
            get(handlers::customers::get_customer).put(handlers::customers::update_customer),
        );

    let billing = Router::new()
        .route("/billing/status", get(handlers::billing::billing_status))
        .route("/billing/invoices", get(handlers::billing::list_invoices))
        .route(
            "/billing/webhook",
            post(handlers::payment_webhooks::payment_webhook),
        );

    let gated = orders
        .merge(inventory)
        .merge(customers)
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            handlers::require_active_subscription,
        ));

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(gated)
        .merge(billing)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    Ok(Json(ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    state.db.ping().await?;
    Ok(Json(ApiResponse::success(json!({
        "database": "up",
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}

pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn pagination_math() {
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 45, 2, 20);
        assert_eq!(page.total_pages, 3);
        let empty: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn list_query_normalization_caps_limit() {
        let q = ListQuery {
            page: 0,
            limit: 10_000,
            search: None,
            status: None,
        };
        assert_eq!(q.normalized(), (1, 100));
    }

    #[test]
    fn success_envelope_carries_data() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        assert!(response.meta.is_some());
    }
}
