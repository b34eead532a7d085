mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sea_orm::EntityTrait;
use washtrack_api::{
    entities::{business, invoice},
    errors::ServiceError,
    events::Event,
    services::billing::WebhookOutcome,
};

#[tokio::test]
async fn captured_payment_extends_the_subscription() {
    let mut app = common::spawn_app().await;
    let business_id = common::seed_trial_business(&app.db, "Fresh Fold", None).await;
    let invoice_id = common::seed_invoice(&app.db, business_id, "order_G1x9", 3).await;

    let outcome = app
        .services
        .billing
        .apply_gateway_event("payment.captured", "order_G1x9", Some("pay_29QQ".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);

    let row = invoice::Entity::find_by_id(invoice_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "paid");
    assert_eq!(row.gateway_payment_id.as_deref(), Some("pay_29QQ"));

    // Trial tenant with no prior end date: 3 months land as 90 days from now.
    let biz = business::Entity::find_by_id(business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(biz.plan_type, "premium");
    assert_eq!(biz.plan_status, "active");
    let ends = biz.subscription_ends_at.expect("end date set");
    let delta = ends - Utc::now();
    assert!(delta > Duration::days(89) && delta <= Duration::days(90));

    assert_matches!(app.events.try_recv().unwrap(), Event::InvoicePaid { .. });
}

#[tokio::test]
async fn renewal_extends_from_the_current_end_date() {
    let app = common::spawn_app().await;
    // spawn_app seeds the default business with ~90 days remaining.
    common::seed_invoice(&app.db, app.business_id, "order_rnw1", 1).await;

    app.services
        .billing
        .apply_gateway_event("order.paid", "order_rnw1", None)
        .await
        .unwrap();

    let biz = business::Entity::find_by_id(app.business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    let delta = biz.subscription_ends_at.unwrap() - Utc::now();
    assert!(delta > Duration::days(119) && delta <= Duration::days(120));
}

#[tokio::test]
async fn replayed_event_is_absorbed_without_a_second_extension() {
    let app = common::spawn_app().await;
    let business_id = common::seed_trial_business(&app.db, "Fresh Fold", None).await;
    common::seed_invoice(&app.db, business_id, "order_dup", 1).await;

    app.services
        .billing
        .apply_gateway_event("payment.captured", "order_dup", Some("pay_1".to_string()))
        .await
        .unwrap();
    let first_end = business::Entity::find_by_id(business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap()
        .subscription_ends_at
        .unwrap();

    let outcome = app
        .services
        .billing
        .apply_gateway_event("payment.captured", "order_dup", Some("pay_1".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);

    let second_end = business::Entity::find_by_id(business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap()
        .subscription_ends_at
        .unwrap();
    assert_eq!(first_end, second_end);
}

#[tokio::test]
async fn failed_payment_marks_the_invoice_without_touching_the_plan() {
    let app = common::spawn_app().await;
    let business_id = common::seed_trial_business(&app.db, "Fresh Fold", None).await;
    let invoice_id = common::seed_invoice(&app.db, business_id, "order_bad", 1).await;

    let outcome = app
        .services
        .billing
        .apply_gateway_event("payment.failed", "order_bad", None)
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);

    let row = invoice::Entity::find_by_id(invoice_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "failed");

    let biz = business::Entity::find_by_id(business_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(biz.plan_type, "trial");
    assert!(biz.subscription_ends_at.is_none());
}

#[tokio::test]
async fn unhandled_event_types_are_acknowledged_and_ignored() {
    let app = common::spawn_app().await;
    let outcome = app
        .services
        .billing
        .apply_gateway_event("order.created", "order_whatever", None)
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Ignored);
}

#[tokio::test]
async fn unknown_gateway_order_is_an_error() {
    let app = common::spawn_app().await;
    let err = app
        .services
        .billing
        .apply_gateway_event("payment.captured", "order_missing", None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
