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
    services::customers::{CreateCustomerInput, UpdateCustomerInput},
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    responses(
        (status = 201, description = "Customer created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate phone for this business", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let customer = state
        .services
        .customers
        .create_customer(business_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

/// List customers with an optional name/phone search
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    responses((status = 200, description = "Customer list returned")),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let (page, limit) = query.normalized();
    let (customers, total) = state
        .services
        .customers
        .list_customers(business_id, page, limit, query.search.clone())
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        customers, total, page, limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    responses(
        (status = 200, description = "Customer returned"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let customer = state
        .services
        .customers
        .get_customer(business_id, id)
        .await?;
    Ok(Json(ApiResponse::success(customer)))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    responses(
        (status = 200, description = "Customer updated"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate phone for this business", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let business_id = user.require_business()?;
    let customer = state
        .services
        .customers
        .update_customer(business_id, id, input)
        .await?;
    Ok(Json(ApiResponse::success(customer)))
}
