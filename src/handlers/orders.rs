use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    models::OrderStatus,
    services::orders::{CreateOrderInput, OrderResponse},
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusBody {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecordPaymentBody {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AssignDriverBody {
    pub driver_id: Uuid,
}

/// Create an order with its items
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Store or customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order number generation exhausted", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let order = state
        .services
        .orders
        .create_order(business_id, &user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// List orders, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "Order list returned"),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>, ServiceError> {
    let business_id = user.require_business()?;
    let (page, limit) = query.normalized();

    let status = match &query.status {
        Some(raw) => Some(OrderStatus::from_str(raw).map_err(|_| {
            ServiceError::ValidationError(format!("Unknown order status '{}'", raw))
        })?),
        None => None,
    };

    let result = state
        .services
        .orders
        .list_orders(business_id, page, limit, status)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.orders,
        result.total,
        page,
        limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    responses(
        (status = 200, description = "Order returned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let business_id = user.require_business()?;
    let order = state.services.orders.get_order(business_id, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/by-number/{order_number}",
    responses(
        (status = 200, description = "Order returned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order_by_number(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let business_id = user.require_business()?;
    let order = state
        .services
        .orders
        .get_order_by_number(business_id, &order_number)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/items",
    responses(
        (status = 200, description = "Order items returned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order_items(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let items = state
        .services
        .orders
        .get_order_items(business_id, id)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Advance (or cancel) an order through its state machine
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Illegal transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let business_id = user.require_business()?;
    let order = state
        .services
        .orders
        .update_order_status(business_id, id, body.status, &user.user_id, body.notes)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Record a payment against an order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/payments",
    responses(
        (status = 200, description = "Payment recorded"),
        (status = 400, description = "Amount invalid or exceeds due", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RecordPaymentBody>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let business_id = user.require_business()?;
    let order = state
        .services
        .orders
        .record_payment(business_id, id, body.amount)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/assign-driver",
    responses(
        (status = 200, description = "Driver assigned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn assign_driver(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AssignDriverBody>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let business_id = user.require_business()?;
    let order = state
        .services
        .orders
        .assign_driver(business_id, id, body.driver_id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// The append-only status transition log for an order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/history",
    responses(
        (status = 200, description = "History returned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_status_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let history = state
        .services
        .orders
        .get_status_history(business_id, id)
        .await?;
    Ok(Json(ApiResponse::success(history)))
}
