use axum::{extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::{info, warn};

use crate::{errors::ServiceError, services::billing::WebhookOutcome, AppState};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct GatewayEvent {
    event: String,
    data: GatewayEventData,
}

#[derive(Debug, Deserialize)]
struct GatewayEventData {
    order_id: String,
    payment_id: Option<String>,
}

/// Payment gateway webhook (unauthenticated, signature-verified)
///
/// Replayed deliveries are acknowledged without re-applying: an invoice
/// already in a terminal status absorbs the event.
#[utoipa::path(
    post,
    path = "/api/v1/billing/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Webhook accepted"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown gateway order", body = crate::errors::ErrorResponse)
    ),
    tag = "billing"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    if let Some(secret) = state.config.payment_webhook_secret.as_deref() {
        let tolerance = state.config.payment_webhook_tolerance_secs.unwrap_or(300);
        if !verify_signature(&headers, &body, secret, tolerance) {
            warn!("Payment webhook signature verification failed");
            return Err(ServiceError::Unauthorized(
                "Invalid webhook signature".to_string(),
            ));
        }
    } else {
        warn!("Payment webhook secret not configured; accepting unverified webhook");
    }

    let event: GatewayEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid webhook payload: {}", e)))?;

    let outcome = state
        .services
        .billing
        .apply_gateway_event(&event.event, &event.data.order_id, event.data.payment_id)
        .await?;

    if outcome == WebhookOutcome::AlreadyProcessed {
        info!(gateway_order_id = %event.data.order_id, "Duplicate webhook delivery acknowledged");
    }

    Ok((StatusCode::OK, Json(json!({ "outcome": outcome }))))
}

/// HMAC-SHA256 over `"{timestamp}.{body}"`, hex-encoded, with a freshness
/// window on the timestamp.
fn verify_signature(headers: &HeaderMap, payload: &Bytes, secret: &str, tolerance_secs: u64) -> bool {
    let (Some(ts), Some(sig)) = (headers.get("x-timestamp"), headers.get("x-signature")) else {
        return false;
    };
    let (Ok(ts), Ok(sig)) = (ts.to_str(), sig.to_str()) else {
        return false;
    };

    let Ok(ts_i) = ts.parse::<i64>() else {
        return false;
    };
    let now = chrono::Utc::now().timestamp();
    if (now - ts_i).unsigned_abs() > tolerance_secs {
        return false;
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(ts.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    constant_time_eq(&expected, sig)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
