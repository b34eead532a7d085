use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::workshop::{SendToWorkshopInput, WorkshopItemUpdateInput},
    ApiResponse, AppState,
};

/// Send a batch of an order's items to a workshop partner
///
/// Partial-success: ineligible items are skipped with per-item reasons; only
/// an entirely ineligible batch fails.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/workshop",
    responses(
        (status = 200, description = "Batch applied, possibly with skips"),
        (status = 400, description = "Order ineligible or no eligible items", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "workshop"
)]
pub async fn send_items_to_workshop(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<SendToWorkshopInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let batch = state
        .services
        .workshop
        .send_items_to_workshop(business_id, id, &user.user_id, input)
        .await?;
    Ok(Json(ApiResponse::success(batch)))
}

/// Apply a workshop action to a single item
///
/// May auto-advance the parent order when the last pending item becomes ready.
#[utoipa::path(
    put,
    path = "/api/v1/order-items/{id}/workshop",
    responses(
        (status = 200, description = "Item updated"),
        (status = 400, description = "Item not in the required state", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "workshop"
)]
pub async fn update_workshop_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<WorkshopItemUpdateInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let result = state
        .services
        .workshop
        .update_workshop_item(business_id, id, &user.user_id, input)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// All items currently out at workshop partners
#[utoipa::path(
    get,
    path = "/api/v1/workshop/items",
    responses(
        (status = 200, description = "Items returned")
    ),
    tag = "workshop"
)]
pub async fn list_items_at_workshop(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let items = state
        .services
        .workshop
        .list_items_at_workshop(business_id)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}
