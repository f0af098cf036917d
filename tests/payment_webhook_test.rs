//! Payment webhook: signature authentication, confirmation effects,
//! idempotent redelivery and the payment-gated confirmation email.

mod common;

use adire_api::entities::{delivery_tracking, order};
use axum::http::Method;
use common::{response_json, sign_webhook, TestApp};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use uuid::Uuid;

async fn settle_order(app: &TestApp, reference: &str, email: Option<&str>) -> (Uuid, String) {
    let mut payload = json!({
        "customer_name": "Amaka Obi",
        "delivery_address": { "type": "pickup" },
        "items": [{ "product_name": "Adire kaftan", "quantity": 3, "unit_price": "5000" }],
        "delivery_fee": "3500",
        "payment_method": "paystack",
        "payment_reference": reference
    });
    if let Some(email) = email {
        payload["customer_email"] = json!(email);
    }

    let response = app.request(Method::POST, "/orders", Some(payload)).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let order_id = Uuid::parse_str(body["order_id"].as_str().unwrap()).unwrap();
    let order_number = body["order_number"].as_str().unwrap().to_string();
    (order_id, order_number)
}

fn charge_success(reference: &str, event_id: i64) -> Vec<u8> {
    json!({
        "event": "charge.success",
        "id": event_id,
        "data": {
            "id": event_id,
            "reference": reference,
            "status": "success",
            "amount": 1850000
        }
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn missing_signature_is_rejected_without_mutation() {
    let app = TestApp::new().await;
    let (order_id, _) = settle_order(&app, "PSK-wh-1", Some("amaka@example.com")).await;

    let body = charge_success("PSK-wh-1", 101);
    let response = app.post_webhook(&body, None).await;
    assert_eq!(response.status(), 401);

    let reloaded = order::Entity::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, order::OrderStatus::Pending);
    assert_eq!(reloaded.payment_status, order::PaymentStatus::Unpaid);
    assert!(app.outbound.sent().is_empty());
}

#[tokio::test]
async fn signature_over_a_different_body_is_rejected() {
    let app = TestApp::new().await;
    let (order_id, _) = settle_order(&app, "PSK-wh-2", Some("amaka@example.com")).await;

    let body = charge_success("PSK-wh-2", 102);
    let other_body = charge_success("PSK-wh-other", 999);
    let response = app.post_webhook(&body, Some(&sign_webhook(&other_body))).await;
    assert_eq!(response.status(), 401);

    let reloaded = order::Entity::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.payment_status, order::PaymentStatus::Unpaid);
    let tracking_rows = delivery_tracking::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(tracking_rows, 0);
}

#[tokio::test]
async fn valid_charge_success_confirms_the_order_once() {
    let app = TestApp::new().await;
    let (order_id, _) = settle_order(&app, "PSK-wh-3", Some("amaka@example.com")).await;

    let body = charge_success("PSK-wh-3", 103);
    let response = app.post_webhook(&body, Some(&sign_webhook(&body))).await;
    assert_eq!(response.status(), 200);
    let ack = response_json(response).await;
    assert_eq!(ack["received"], json!(true));

    let reloaded = order::Entity::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, order::OrderStatus::Confirmed);
    assert_eq!(reloaded.payment_status, order::PaymentStatus::Paid);

    let tracking_rows = delivery_tracking::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(tracking_rows.len(), 1);
    assert_eq!(tracking_rows[0].status, "confirmed");
    assert_eq!(
        tracking_rows[0].note.as_deref(),
        Some("Payment confirmed via Paystack")
    );
    assert_eq!(
        tracking_rows[0].updated_by,
        delivery_tracking::TrackingActor::System
    );

    let sent = app.outbound.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "amaka@example.com");
    assert!(sent[0].subject.as_deref().unwrap().contains("confirmed"));
}

#[tokio::test]
async fn redelivered_event_is_deduplicated() {
    let app = TestApp::new().await;
    settle_order(&app, "PSK-wh-4", Some("amaka@example.com")).await;

    let body = charge_success("PSK-wh-4", 104);
    let signature = sign_webhook(&body);
    for _ in 0..3 {
        let response = app.post_webhook(&body, Some(&signature)).await;
        assert_eq!(response.status(), 200);
    }

    let tracking_rows = delivery_tracking::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(tracking_rows, 1, "replays must not append tracking rows");
    assert_eq!(app.outbound.sent().len(), 1, "replays must not resend email");
}

#[tokio::test]
async fn unknown_reference_is_acknowledged_without_effect() {
    let app = TestApp::new().await;

    let body = charge_success("PSK-no-such-order", 105);
    let response = app.post_webhook(&body, Some(&sign_webhook(&body))).await;
    assert_eq!(response.status(), 200);
    assert!(app.outbound.sent().is_empty());
}

#[tokio::test]
async fn other_event_types_are_ignored() {
    let app = TestApp::new().await;
    let (order_id, _) = settle_order(&app, "PSK-wh-5", Some("amaka@example.com")).await;

    let body = json!({
        "event": "transfer.success",
        "data": { "id": 106, "reference": "PSK-wh-5" }
    })
    .to_string()
    .into_bytes();

    let response = app.post_webhook(&body, Some(&sign_webhook(&body))).await;
    assert_eq!(response.status(), 200);

    let reloaded = order::Entity::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.payment_status, order::PaymentStatus::Unpaid);
}

#[tokio::test]
async fn confirmation_without_customer_email_skips_the_email() {
    let app = TestApp::new().await;
    let (order_id, _) = settle_order(&app, "PSK-wh-6", None).await;

    let body = charge_success("PSK-wh-6", 107);
    let response = app.post_webhook(&body, Some(&sign_webhook(&body))).await;
    assert_eq!(response.status(), 200);

    let reloaded = order::Entity::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, order::OrderStatus::Confirmed);
    assert!(app.outbound.sent().is_empty());
}

#[tokio::test]
async fn missing_server_secret_fails_closed() {
    let app = TestApp::new_with(|cfg| cfg.paystack_webhook_secret = None).await;

    let body = charge_success("PSK-wh-7", 108);
    let response = app.post_webhook(&body, Some(&sign_webhook(&body))).await;
    assert_eq!(response.status(), 500);
}
