use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::business::{ActiveModel as BusinessActiveModel, Entity as BusinessEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{PlanStatus, PlanType},
};

/// Why access was denied, surfaced to clients so they can render the right
/// upgrade/renewal screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    TrialExpired,
    Cancelled,
    SubscriptionExpired,
}

impl DenialReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrialExpired => "trial_expired",
            Self::Cancelled => "cancelled",
            Self::SubscriptionExpired => "subscription_expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessDecision {
    pub allowed: bool,
    pub plan_type: PlanType,
    pub plan_status: PlanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<DenialReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    /// Show the "trial ends in N days" banner.
    pub trial_banner: bool,
    /// Show the "subscription expiring soon" banner.
    pub expiring_soon: bool,
}

impl AccessDecision {
    fn grant(plan_type: PlanType, plan_status: PlanStatus) -> Self {
        Self {
            allowed: true,
            plan_type,
            plan_status,
            denial_reason: None,
            days_remaining: None,
            trial_banner: false,
            expiring_soon: false,
        }
    }

    fn deny(plan_type: PlanType, plan_status: PlanStatus, reason: DenialReason) -> Self {
        Self {
            allowed: false,
            plan_type,
            plan_status,
            denial_reason: Some(reason),
            days_remaining: None,
            trial_banner: false,
            expiring_soon: false,
        }
    }
}

/// Resolves whether a business currently has access to the product.
///
/// The check is deliberately non-idempotent: reading access can backfill a
/// missing trial end date and can flip an expired paid plan to `suspended`.
/// Callers must not cache the decision across requests.
#[derive(Clone)]
pub struct SubscriptionService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    trial_period_days: i64,
}

impl SubscriptionService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, trial_period_days: i64) -> Self {
        Self {
            db,
            event_sender,
            trial_period_days,
        }
    }

    #[instrument(skip(self), fields(business_id = %business_id))]
    pub async fn check_access(
        &self,
        business_id: Uuid,
        is_super_admin: bool,
    ) -> Result<AccessDecision, ServiceError> {
        let business = BusinessEntity::find_by_id(business_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Business not found".to_string()))?;

        let plan_type = PlanType::from_str(&business.plan_type)
            .map_err(|_| ServiceError::InternalError(format!("Unknown plan '{}'", business.plan_type)))?;
        let plan_status = PlanStatus::from_str(&business.plan_status)
            .map_err(|_| ServiceError::InternalError(format!("Unknown plan status '{}'", business.plan_status)))?;

        if is_super_admin {
            return Ok(AccessDecision::grant(plan_type, plan_status));
        }

        let now = Utc::now();

        if plan_type == PlanType::Trial {
            let trial_ends_at = match business.trial_ends_at {
                Some(ends) => ends,
                None => {
                    // Legacy rows created before trial tracking get their end
                    // date backfilled on first read.
                    let ends = now + Duration::days(self.trial_period_days);
                    let mut active: BusinessActiveModel = business.into();
                    active.trial_ends_at = Set(Some(ends));
                    active.updated_at = Set(Some(now));
                    active.update(&*self.db).await?;
                    info!(business_id = %business_id, "Backfilled trial end date");
                    ends
                }
            };

            if trial_ends_at <= now {
                return Ok(AccessDecision::deny(
                    plan_type,
                    plan_status,
                    DenialReason::TrialExpired,
                ));
            }

            let mut decision = AccessDecision::grant(plan_type, plan_status);
            decision.days_remaining = Some(days_remaining(trial_ends_at - now));
            decision.trial_banner = true;
            return Ok(decision);
        }

        if plan_status == PlanStatus::Cancelled {
            return Ok(AccessDecision::deny(
                plan_type,
                plan_status,
                DenialReason::Cancelled,
            ));
        }

        // Paid plan with no recorded end date: treat as unconstrained rather
        // than locking a paying tenant out over missing bookkeeping.
        let Some(subscription_ends_at) = business.subscription_ends_at else {
            return Ok(AccessDecision::grant(plan_type, plan_status));
        };

        if subscription_ends_at <= now {
            if plan_status != PlanStatus::Suspended {
                let mut active: BusinessActiveModel = business.into();
                active.plan_status = Set(PlanStatus::Suspended.to_string());
                active.updated_at = Set(Some(now));
                active.update(&*self.db).await?;
                warn!(business_id = %business_id, "Subscription lapsed, plan suspended");
                self.event_sender
                    .send(Event::SubscriptionSuspended { business_id })
                    .await;
            }
            return Ok(AccessDecision::deny(
                plan_type,
                PlanStatus::Suspended,
                DenialReason::SubscriptionExpired,
            ));
        }

        let remaining = days_remaining(subscription_ends_at - now);
        let mut decision = AccessDecision::grant(plan_type, plan_status);
        decision.days_remaining = Some(remaining);
        decision.expiring_soon = remaining <= 3;
        Ok(decision)
    }
}

/// Whole days left, rounded up so "23 hours" reads as 1 day, not 0.
fn days_remaining(delta: Duration) -> i64 {
    let secs = delta.num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + 86_399) / 86_400
}
