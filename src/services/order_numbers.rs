//! Human-readable order number generation: `{STORECODE}-{YYMMDD}-{NNNN}`.
//!
//! The next sequence is found by scanning for the business's highest existing
//! number under today's prefix. This read-then-write is intentionally NOT
//! protected by a lock; concurrent creators are reconciled by the unique
//! constraint on `order_number` plus the retry loop in order creation. Do not
//! replace this with a DB sequence or row lock — the retry contract is
//! load-bearing for the order-creation flow.

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, SqlErr,
};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    entities::order::{self, Entity as OrderEntity},
    errors::ServiceError,
};

/// Maximum creation attempts before surfacing a user-facing conflict.
pub const MAX_ATTEMPTS: u32 = 5;

/// Fallback store code when the store name has no ASCII letters.
const FALLBACK_CODE: &str = "STR";

/// Derives the 3-letter store code: strip non-letters, uppercase, take the
/// first three characters.
pub fn store_code(store_name: &str) -> String {
    let code: String = store_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();

    if code.is_empty() {
        FALLBACK_CODE.to_string()
    } else {
        code
    }
}

/// Builds the per-store, per-day prefix, e.g. `SPA-260110-`.
pub fn day_prefix(code: &str, date: NaiveDate) -> String {
    format!("{}-{}-", code, date.format("%y%m%d"))
}

/// Computes the next order number for the business under the given prefix by
/// scanning for the lexicographically highest existing number and
/// incrementing its 4-digit suffix.
pub async fn next_order_number<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    store_name: &str,
    date: NaiveDate,
) -> Result<String, ServiceError> {
    let prefix = day_prefix(&store_code(store_name), date);

    let highest = OrderEntity::find()
        .filter(order::Column::BusinessId.eq(business_id))
        .filter(order::Column::OrderNumber.starts_with(prefix.as_str()))
        .order_by_desc(order::Column::OrderNumber)
        .one(db)
        .await?;

    let next_seq = match highest {
        Some(existing) => parse_sequence(&existing.order_number).unwrap_or(0) + 1,
        None => 1,
    };

    Ok(format!("{}{:04}", prefix, next_seq))
}

fn parse_sequence(order_number: &str) -> Option<u32> {
    order_number.rsplit('-').next()?.parse().ok()
}

/// True only for a uniqueness violation on the order-number constraint.
/// Other unique columns on the same insert (item tag numbers, say) must not
/// trigger a regenerate-and-retry, and every non-uniqueness error propagates
/// immediately.
pub fn is_order_number_collision(err: &DbErr) -> bool {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => message.contains("order_number"),
        _ => false,
    }
}

/// Short, attempt-increasing backoff before regenerating after a collision.
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(50 * u64::from(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_code_strips_and_uppercases() {
        assert_eq!(store_code("Sparkle Wash 24"), "SPA");
        assert_eq!(store_code("blue-bubble"), "BLU");
        assert_eq!(store_code("ok"), "OK");
        assert_eq!(store_code("24/7"), "STR");
        assert_eq!(store_code(""), "STR");
    }

    #[test]
    fn prefix_uses_two_digit_year() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        assert_eq!(day_prefix("SPA", date), "SPA-260110-");
    }

    #[test]
    fn sequence_parsing_reads_trailing_digits() {
        assert_eq!(parse_sequence("SPA-260110-0042"), Some(42));
        assert_eq!(parse_sequence("SPA-260110-9999"), Some(9999));
        assert_eq!(parse_sequence("garbage"), None);
    }

    #[test]
    fn backoff_grows_with_attempts() {
        assert_eq!(backoff(1), Duration::from_millis(50));
        assert_eq!(backoff(4), Duration::from_millis(200));
    }
}
