mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use washtrack_api::{
    errors::ServiceError,
    models::{OrderChannel, OrderStatus},
    services::orders::{CreateOrderInput, CreateOrderItemInput},
};

fn order_input(app: &common::TestApp, channel: OrderChannel) -> CreateOrderInput {
    CreateOrderInput {
        store_id: app.store_id,
        customer_id: app.customer_id,
        channel,
        items: vec![
            CreateOrderItemInput {
                name: "Shirt".into(),
                service_type: Some("dry_clean".into()),
                quantity: 2,
                unit_price: dec!(50),
                is_express: false,
            },
            CreateOrderItemInput {
                name: "Saree".into(),
                service_type: Some("dry_clean".into()),
                quantity: 1,
                unit_price: dec!(200),
                is_express: true,
            },
        ],
        discount: Some(dec!(0)),
        pickup_date: None,
        delivery_date: None,
        notes: None,
    }
}

#[tokio::test]
async fn walk_in_order_starts_in_progress_with_priced_items() {
    let app = common::spawn_app().await;

    let order = app
        .services
        .orders
        .create_order(app.business_id, "owner-1", order_input(&app, OrderChannel::WalkIn))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::InProgress);
    // 2 x 50 + 1 x 200 x 1.5 express = 400; GST 18% on 400 = 72
    assert_eq!(order.subtotal, dec!(400.00));
    assert_eq!(order.gst_amount, dec!(72.00));
    assert_eq!(order.total_amount, dec!(472.00));
    assert_eq!(order.payment_status, "unpaid");

    let items = app
        .services
        .orders
        .get_order_items(app.business_id, order.id)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0].tag_number.starts_with(&order.order_number));
    assert!(items[0].tag_number.ends_with("-01"));

    let history = app
        .services
        .orders
        .get_status_history(app.business_id, order.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_status, "in_progress");
}

#[tokio::test]
async fn pickup_order_stamps_milestones_through_the_lifecycle() {
    let app = common::spawn_app().await;

    let order = app
        .services
        .orders
        .create_order(
            app.business_id,
            "owner-1",
            order_input(&app, OrderChannel::PickupRequest),
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pickup);
    assert!(order.picked_up_at.is_none());

    let order = app
        .services
        .orders
        .update_order_status(
            app.business_id,
            order.id,
            OrderStatus::InProgress,
            "driver-7",
            None,
        )
        .await
        .unwrap();
    assert!(order.picked_up_at.is_some());
    assert!(order.delivered_at.is_none());

    for status in [
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Completed,
    ] {
        app.services
            .orders
            .update_order_status(app.business_id, order.id, status, "staff-2", None)
            .await
            .unwrap();
    }

    let order = app
        .services
        .orders
        .get_order(app.business_id, order.id)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.delivered_at.is_some());

    let history = app
        .services
        .orders
        .get_status_history(app.business_id, order.id)
        .await
        .unwrap();
    // creation + four transitions
    assert_eq!(history.len(), 5);
    assert_eq!(history.last().unwrap().to_status, "completed");
}

#[tokio::test]
async fn illegal_transitions_are_rejected() {
    let app = common::spawn_app().await;

    let order = app
        .services
        .orders
        .create_order(
            app.business_id,
            "owner-1",
            order_input(&app, OrderChannel::PickupRequest),
        )
        .await
        .unwrap();

    let err = app
        .services
        .orders
        .update_order_status(
            app.business_id,
            order.id,
            OrderStatus::Completed,
            "owner-1",
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn cancelled_is_terminal() {
    let app = common::spawn_app().await;

    let order = app
        .services
        .orders
        .create_order(app.business_id, "owner-1", order_input(&app, OrderChannel::WalkIn))
        .await
        .unwrap();

    let order = app
        .services
        .orders
        .cancel_order(
            app.business_id,
            order.id,
            "owner-1",
            Some("Customer changed their mind".into()),
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);

    let err = app
        .services
        .orders
        .update_order_status(
            app.business_id,
            order.id,
            OrderStatus::InProgress,
            "owner-1",
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn payments_accumulate_and_never_exceed_the_total() {
    let app = common::spawn_app().await;

    let order = app
        .services
        .orders
        .create_order(app.business_id, "owner-1", order_input(&app, OrderChannel::WalkIn))
        .await
        .unwrap();
    assert_eq!(order.total_amount, dec!(472.00));

    let order = app
        .services
        .orders
        .record_payment(app.business_id, order.id, dec!(200))
        .await
        .unwrap();
    assert_eq!(order.payment_status, "partial");
    assert_eq!(order.due_amount, dec!(272.00));

    let err = app
        .services
        .orders
        .record_payment(app.business_id, order.id, dec!(500))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let order = app
        .services
        .orders
        .record_payment(app.business_id, order.id, dec!(272))
        .await
        .unwrap();
    assert_eq!(order.payment_status, "paid");
    assert_eq!(order.due_amount, dec!(0.00));
}

#[tokio::test]
async fn orders_are_invisible_across_tenants() {
    let app = common::spawn_app().await;
    let other_business = common::seed_business(&app.db, "Rival Laundry").await;

    let order = app
        .services
        .orders
        .create_order(app.business_id, "owner-1", order_input(&app, OrderChannel::WalkIn))
        .await
        .unwrap();

    let err = app
        .services
        .orders
        .get_order(other_business, order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
