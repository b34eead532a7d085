mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use washtrack_api::{
    entities::business,
    events::Event,
    models::{PlanStatus, PlanType},
    services::subscription::DenialReason,
};

#[tokio::test]
async fn active_trial_grants_with_banner_and_countdown() {
    let app = common::spawn_app().await;
    let ends = Utc::now() + Duration::days(5);
    let business_id = common::seed_trial_business(&app.db, "Fresh Fold", Some(ends)).await;

    let decision = app
        .services
        .subscription
        .check_access(business_id, false)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert!(decision.trial_banner);
    assert_eq!(decision.plan_type, PlanType::Trial);
    assert_eq!(decision.days_remaining, Some(5));
    assert!(decision.denial_reason.is_none());
}

#[tokio::test]
async fn trial_without_end_date_is_backfilled_on_first_read() {
    let app = common::spawn_app().await;
    let business_id = common::seed_trial_business(&app.db, "Fresh Fold", None).await;

    let decision = app
        .services
        .subscription
        .check_access(business_id, false)
        .await
        .unwrap();
    assert!(decision.allowed);
    // spawn_app configures a 14-day trial period.
    assert_eq!(decision.days_remaining, Some(14));

    let row = business::Entity::find_by_id(business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    let ends = row.trial_ends_at.expect("backfilled end date");
    let delta = ends - Utc::now();
    assert!(delta > Duration::days(13) && delta <= Duration::days(14));
}

#[tokio::test]
async fn expired_trial_is_denied() {
    let app = common::spawn_app().await;
    let business_id =
        common::seed_trial_business(&app.db, "Fresh Fold", Some(Utc::now() - Duration::hours(1)))
            .await;

    let decision = app
        .services
        .subscription
        .check_access(business_id, false)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.denial_reason, Some(DenialReason::TrialExpired));
}

#[tokio::test]
async fn cancelled_plan_is_denied() {
    let app = common::spawn_app().await;
    let row = business::Entity::find_by_id(app.business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: business::ActiveModel = row.into();
    active.plan_status = Set("cancelled".to_string());
    active.update(&*app.db).await.unwrap();

    let decision = app
        .services
        .subscription
        .check_access(app.business_id, false)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.denial_reason, Some(DenialReason::Cancelled));
}

#[tokio::test]
async fn lapsed_paid_plan_is_suspended_on_read() {
    let mut app = common::spawn_app().await;
    let row = business::Entity::find_by_id(app.business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: business::ActiveModel = row.into();
    active.subscription_ends_at = Set(Some(Utc::now() - Duration::days(2)));
    active.update(&*app.db).await.unwrap();

    let decision = app
        .services
        .subscription
        .check_access(app.business_id, false)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(
        decision.denial_reason,
        Some(DenialReason::SubscriptionExpired)
    );
    assert_eq!(decision.plan_status, PlanStatus::Suspended);

    // The flip is persisted, not just reported.
    let row = business::Entity::find_by_id(app.business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.plan_status, "suspended");
    assert_matches!(
        app.events.try_recv().unwrap(),
        Event::SubscriptionSuspended { .. }
    );

    // A second read denies again but does not re-suspend or re-notify.
    app.services
        .subscription
        .check_access(app.business_id, false)
        .await
        .unwrap();
    assert!(app.events.try_recv().is_err());
}

#[tokio::test]
async fn expiring_soon_flag_kicks_in_inside_three_days() {
    let app = common::spawn_app().await;
    let row = business::Entity::find_by_id(app.business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: business::ActiveModel = row.into();
    active.subscription_ends_at = Set(Some(Utc::now() + Duration::days(2)));
    active.update(&*app.db).await.unwrap();

    let decision = app
        .services
        .subscription
        .check_access(app.business_id, false)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert!(decision.expiring_soon);
    assert_eq!(decision.days_remaining, Some(2));
}

#[tokio::test]
async fn super_admin_bypasses_every_gate() {
    let app = common::spawn_app().await;
    let business_id =
        common::seed_trial_business(&app.db, "Fresh Fold", Some(Utc::now() - Duration::days(30)))
            .await;

    let decision = app
        .services
        .subscription
        .check_access(business_id, true)
        .await
        .unwrap();
    assert!(decision.allowed);
}
