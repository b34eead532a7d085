use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::inventory::{AdjustStockInput, CreateInventoryItemInput, UpdateInventoryItemInput},
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    responses(
        (status = 201, description = "Inventory item created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate SKU", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateInventoryItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let item = state
        .services
        .inventory
        .create_item(business_id, &user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    responses((status = 200, description = "Inventory list returned")),
    tag = "inventory"
)]
pub async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let (page, limit) = query.normalized();
    let (items, total) = state
        .services
        .inventory
        .list_items(business_id, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Items at or below their low-stock threshold
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses((status = 200, description = "Low-stock items returned")),
    tag = "inventory"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let items = state.services.inventory.list_low_stock(business_id).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    responses(
        (status = 200, description = "Inventory item returned"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let item = state.services.inventory.get_item(business_id, id).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    responses(
        (status = 200, description = "Inventory item updated"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateInventoryItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let item = state
        .services
        .inventory
        .update_item(business_id, id, input)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Adjust stock up or down; removals below zero are rejected
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{id}/adjust",
    responses(
        (status = 200, description = "Stock adjusted"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Removal exceeds current stock", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let result = state
        .services
        .inventory
        .adjust_stock(business_id, id, &user.user_id, input)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// The adjustment audit trail for one item
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}/restock-log",
    responses(
        (status = 200, description = "Restock log returned"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_restock_log(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let log = state
        .services
        .inventory
        .get_restock_log(business_id, id)
        .await?;
    Ok(Json(ApiResponse::success(log)))
}
