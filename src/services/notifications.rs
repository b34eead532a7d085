//! Fire-and-forget push notifications via an external relay.
//!
//! Delivery failures are logged and swallowed. A failed low-stock alert must
//! never fail the stock adjustment it originated from.

use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct PushClient {
    http: reqwest::Client,
    relay_url: String,
}

impl PushClient {
    pub fn new(relay_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { http, relay_url }
    }

    /// Posts a notification to the relay. Never returns an error.
    pub async fn notify(&self, business_id: Uuid, title: &str, body: &str) {
        let payload = json!({
            "business_id": business_id,
            "title": title,
            "body": body,
        });

        match self.http.post(&self.relay_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(business_id = %business_id, title = title, "Push notification delivered");
            }
            Ok(resp) => {
                warn!(
                    business_id = %business_id,
                    status = resp.status().as_u16(),
                    "Push relay rejected notification"
                );
            }
            Err(e) => {
                warn!(business_id = %business_id, error = %e, "Push notification failed");
            }
        }
    }
}
