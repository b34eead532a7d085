mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;
use washtrack_api::{
    errors::ServiceError,
    models::{OrderChannel, OrderStatus, WorkshopAction},
    services::orders::{CreateOrderInput, CreateOrderItemInput},
    services::workshop::{SendToWorkshopInput, WorkshopItemUpdateInput},
};

async fn create_in_progress_order(app: &common::TestApp, item_names: &[&str]) -> (Uuid, Vec<Uuid>) {
    let items = item_names
        .iter()
        .map(|name| CreateOrderItemInput {
            name: name.to_string(),
            service_type: Some("dry_clean".into()),
            quantity: 1,
            unit_price: dec!(100),
            is_express: false,
        })
        .collect();

    let order = app
        .services
        .orders
        .create_order(
            app.business_id,
            "owner-1",
            CreateOrderInput {
                store_id: app.store_id,
                customer_id: app.customer_id,
                channel: OrderChannel::WalkIn,
                items,
                discount: None,
                pickup_date: None,
                delivery_date: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let item_ids = app
        .services
        .orders
        .get_order_items(app.business_id, order.id)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();

    (order.id, item_ids)
}

fn batch(item_ids: Vec<Uuid>) -> SendToWorkshopInput {
    SendToWorkshopInput {
        item_ids,
        partner_name: Some("Prime Dry Cleaners".into()),
        notes: None,
    }
}

fn act(action: WorkshopAction) -> WorkshopItemUpdateInput {
    WorkshopItemUpdateInput {
        action,
        notes: None,
    }
}

#[tokio::test]
async fn sending_every_item_moves_the_order_to_at_workshop() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt", "Coat"]).await;

    let result = app
        .services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids))
        .await
        .unwrap();

    assert_eq!(result.sent_count, 2);
    assert!(result.skipped.is_empty());
    assert_eq!(result.order_status, OrderStatus::AtWorkshop);
}

#[tokio::test]
async fn partial_batch_skips_with_reasons_and_keeps_the_order_in_progress() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt", "Coat"]).await;

    // First batch sends one item.
    let result = app
        .services
        .workshop
        .send_items_to_workshop(
            app.business_id,
            order_id,
            "staff-3",
            batch(vec![item_ids[0]]),
        )
        .await
        .unwrap();
    assert_eq!(result.sent_count, 1);
    assert_eq!(result.order_status, OrderStatus::InProgress);

    // Second batch includes the already-sent item plus the remaining one:
    // partial success, with a reason for the duplicate.
    let result = app
        .services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids.clone()))
        .await
        .unwrap();
    assert_eq!(result.sent_count, 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].item_id, item_ids[0]);
    assert!(result.skipped[0].reason.contains("Already at workshop"));
    assert_eq!(result.order_status, OrderStatus::AtWorkshop);
}

#[tokio::test]
async fn fully_ineligible_batch_is_an_error_listing_every_reason() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt"]).await;

    app.services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids.clone()))
        .await
        .unwrap();

    let err = app
        .services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(ref msg) if msg.contains("Already at workshop"));
}

#[tokio::test]
async fn batches_require_an_in_progress_or_ready_order() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt"]).await;

    app.services
        .orders
        .cancel_order(app.business_id, order_id, "owner-1", None)
        .await
        .unwrap();

    let err = app
        .services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn last_ready_item_auto_advances_the_order_with_an_audit_note() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt", "Coat"]).await;

    app.services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids.clone()))
        .await
        .unwrap();

    // First item comes straight back to the store ready; the second is still
    // out, so the order drops out of the workshop branch instead of advancing.
    let first = app
        .services
        .workshop
        .update_workshop_item(
            app.business_id,
            item_ids[0],
            "staff-3",
            act(WorkshopAction::ReturnToStore),
        )
        .await
        .unwrap();
    assert_eq!(first.item.status, "ready");
    assert_eq!(first.order_status, OrderStatus::InProgress);

    // Second item goes through the full return-then-QC path.
    app.services
        .workshop
        .update_workshop_item(
            app.business_id,
            item_ids[1],
            "staff-3",
            act(WorkshopAction::MarkReturned),
        )
        .await
        .unwrap();
    let second = app
        .services
        .workshop
        .update_workshop_item(
            app.business_id,
            item_ids[1],
            "staff-3",
            act(WorkshopAction::MarkReady),
        )
        .await
        .unwrap();
    assert!(second.order_auto_advanced);
    assert_eq!(second.order_status, OrderStatus::Ready);

    let history = app
        .services
        .orders
        .get_status_history(app.business_id, order_id)
        .await
        .unwrap();
    let auto = history.last().unwrap();
    assert_eq!(auto.to_status, "ready");
    assert_eq!(auto.notes.as_deref(), Some("Auto-updated: All items are ready"));
}

#[tokio::test]
async fn returned_item_pulls_the_order_back_in_house() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt"]).await;

    app.services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids.clone()))
        .await
        .unwrap();

    let result = app
        .services
        .workshop
        .update_workshop_item(
            app.business_id,
            item_ids[0],
            "staff-3",
            WorkshopItemUpdateInput {
                action: WorkshopAction::MarkReturned,
                notes: Some("Stain needs in-house QC".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(result.item.status, "workshop_returned");
    assert!(!result.item.sent_to_workshop);
    assert!(result.item.workshop_returned_date.is_some());
    assert_eq!(result.order_status, OrderStatus::InProgress);
}

#[tokio::test]
async fn qc_pass_requires_the_item_to_be_returned_first() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt"]).await;

    app.services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids.clone()))
        .await
        .unwrap();

    // Straight from at_workshop, before mark_returned.
    let err = app
        .services
        .workshop
        .update_workshop_item(
            app.business_id,
            item_ids[0],
            "staff-3",
            act(WorkshopAction::MarkReady),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn return_to_store_readies_an_item_straight_from_the_workshop() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt"]).await;

    app.services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids.clone()))
        .await
        .unwrap();

    let result = app
        .services
        .workshop
        .update_workshop_item(
            app.business_id,
            item_ids[0],
            "staff-3",
            act(WorkshopAction::ReturnToStore),
        )
        .await
        .unwrap();
    assert_eq!(result.item.status, "ready");
    assert!(!result.item.sent_to_workshop);
    assert!(result.item.workshop_returned_date.is_some());
    assert!(result.order_auto_advanced);
    assert_eq!(result.order_status, OrderStatus::Ready);
}

#[tokio::test]
async fn ready_orders_can_re_enter_the_workshop_branch() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt"]).await;

    app.services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids.clone()))
        .await
        .unwrap();
    app.services
        .workshop
        .update_workshop_item(
            app.business_id,
            item_ids[0],
            "staff-3",
            act(WorkshopAction::ReturnToStore),
        )
        .await
        .unwrap();

    // The QC miss goes back out; the whole order follows its only item.
    let result = app
        .services
        .workshop
        .send_items_to_workshop(app.business_id, order_id, "staff-3", batch(item_ids))
        .await
        .unwrap();
    assert_eq!(result.sent_count, 1);
    assert_eq!(result.order_status, OrderStatus::AtWorkshop);
}

#[tokio::test]
async fn missing_partner_name_defaults_to_external_workshop() {
    let app = common::spawn_app().await;
    let (order_id, item_ids) = create_in_progress_order(&app, &["Shirt"]).await;

    app.services
        .workshop
        .send_items_to_workshop(
            app.business_id,
            order_id,
            "staff-3",
            SendToWorkshopInput {
                item_ids,
                partner_name: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let items = app
        .services
        .orders
        .get_order_items(app.business_id, order_id)
        .await
        .unwrap();
    assert_eq!(
        items[0].workshop_partner_name.as_deref(),
        Some("External Workshop")
    );
}

#[tokio::test]
async fn workshop_actions_enforce_item_preconditions() {
    let app = common::spawn_app().await;
    let (_, item_ids) = create_in_progress_order(&app, &["Shirt"]).await;

    // The item never went to a workshop.
    let err = app
        .services
        .workshop
        .update_workshop_item(
            app.business_id,
            item_ids[0],
            "staff-3",
            WorkshopItemUpdateInput {
                action: WorkshopAction::MarkReady,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}
