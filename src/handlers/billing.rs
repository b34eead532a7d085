use axum::{extract::State, response::IntoResponse, Json};

use crate::{auth::AuthUser, errors::ServiceError, ApiResponse, AppState};

/// Current subscription state for the caller's business
///
/// Reading this can mutate the business row: a missing trial end date is
/// backfilled, and a lapsed paid plan is flipped to suspended.
#[utoipa::path(
    get,
    path = "/api/v1/billing/status",
    responses(
        (status = 200, description = "Access decision returned"),
        (status = 404, description = "Business not found", body = crate::errors::ErrorResponse)
    ),
    tag = "billing"
)]
pub async fn billing_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let decision = state
        .services
        .subscription
        .check_access(business_id, user.is_super_admin)
        .await?;
    Ok(Json(ApiResponse::success(decision)))
}

#[utoipa::path(
    get,
    path = "/api/v1/billing/invoices",
    responses((status = 200, description = "Invoices returned")),
    tag = "billing"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let invoices = state.services.billing.list_invoices(business_id).await?;
    Ok(Json(ApiResponse::success(invoices)))
}
