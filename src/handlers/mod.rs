//! HTTP handlers. Thin adapters: authenticate, resolve the tenant, call a
//! service with an explicit `business_id`, wrap the result in `ApiResponse`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{auth::AuthUser, errors::ServiceError, AppState};

pub mod billing;
pub mod customers;
pub mod inventory;
pub mod orders;
pub mod payment_webhooks;
pub mod workshop;

/// Gate on the subscription resolver. Super admins bypass; everyone else is
/// resolved freshly per request, which means merely hitting a gated route can
/// backfill a trial end date or suspend a lapsed paid plan.
pub async fn require_active_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if user.is_super_admin {
        return Ok(next.run(request).await);
    }

    let business_id = user.require_business()?;
    let decision = state
        .services
        .subscription
        .check_access(business_id, false)
        .await?;

    if !decision.allowed {
        let reason = decision
            .denial_reason
            .map(|r| r.as_str())
            .unwrap_or("inactive");
        return Err(ServiceError::SubscriptionRequired(format!(
            "Subscription is not active ({})",
            reason
        )));
    }

    Ok(next.run(request).await)
}
