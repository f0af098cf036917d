//! Public tracking and the admin status surface: not-found distinctness,
//! PII sanitization, append-only tracking history and notification flags.

mod common;

use adire_api::entities::delivery_tracking;
use axum::http::Method;
use common::{response_json, sign_webhook, TestApp};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::json;
use uuid::Uuid;

async fn settle_order(app: &TestApp, reference: &str, email: Option<&str>) -> (Uuid, String) {
    let mut payload = json!({
        "customer_name": "Amaka Obi",
        "customer_phone": "+2348098765432",
        "delivery_address": {
            "type": "delivery",
            "street": "14 Bode Thomas St",
            "city": "Surulere",
            "state": "Lagos",
            "country": "Nigeria"
        },
        "items": [{ "product_name": "Adire kaftan", "quantity": 1, "unit_price": "5000" }],
        "delivery_fee": "2500",
        "payment_method": "paystack",
        "payment_reference": reference
    });
    if let Some(email) = email {
        payload["customer_email"] = json!(email);
    }

    let response = app.request(Method::POST, "/orders", Some(payload)).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    (
        Uuid::parse_str(body["order_id"].as_str().unwrap()).unwrap(),
        body["order_number"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn unknown_order_number_is_a_clean_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/orders/ADR-2025-XXXXXX", None)
        .await;
    assert_eq!(response.status(), 404);
    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Order not found"));
}

#[tokio::test]
async fn tracking_response_never_exposes_contact_details() {
    let app = TestApp::new().await;
    let (_, order_number) = settle_order(&app, "PSK-tr-1", Some("amaka@example.com")).await;

    let response = app
        .request(Method::GET, &format!("/orders/{order_number}"), None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;

    let order = body["order"].as_object().unwrap();
    assert!(!order.contains_key("customer_email"));
    assert!(!order.contains_key("customer_phone"));
    assert!(!order.contains_key("customer_whatsapp"));
    assert_eq!(order["delivery_address"]["state"], json!("Lagos"));
}

#[tokio::test]
async fn admin_updates_append_immutable_tracking_events() {
    let app = TestApp::new().await;
    let (order_id, order_number) = settle_order(&app, "PSK-tr-2", Some("amaka@example.com")).await;

    // Payment confirmation appends the first event
    let body = json!({
        "event": "charge.success",
        "data": { "id": 201, "reference": "PSK-tr-2" }
    })
    .to_string()
    .into_bytes();
    let response = app.post_webhook(&body, Some(&sign_webhook(&body))).await;
    assert_eq!(response.status(), 200);

    // Then three admin-driven transitions
    for status in ["processing", "shipped", "delivered"] {
        let response = app
            .request_admin(
                Method::PATCH,
                &format!("/admin/orders/{order_id}"),
                Some(json!({ "status": status, "note": format!("now {status}") })),
            )
            .await;
        assert_eq!(response.status(), 200);
    }

    let rows = delivery_tracking::Entity::find()
        .filter(delivery_tracking::Column::OrderId.eq(order_id))
        .order_by_asc(delivery_tracking::Column::UpdatedAt)
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].status, "confirmed");
    assert_eq!(rows[0].updated_by, delivery_tracking::TrackingActor::System);
    assert_eq!(rows[3].status, "delivered");
    assert_eq!(rows[3].updated_by, delivery_tracking::TrackingActor::Admin);

    // Public view returns the same events newest-first
    let response = app
        .request(Method::GET, &format!("/orders/{order_number}"), None)
        .await;
    let body = response_json(response).await;
    let tracking = body["tracking"].as_array().unwrap();
    assert_eq!(tracking.len(), 4);
    assert_eq!(tracking[0]["status"], json!("delivered"));
    assert_eq!(tracking[tracking.len() - 1]["status"], json!("confirmed"));
    assert_eq!(body["order"]["status"], json!("delivered"));
}

#[tokio::test]
async fn admin_surface_requires_the_session_cookie() {
    let app = TestApp::new().await;
    let (order_id, _) = settle_order(&app, "PSK-tr-3", None).await;

    let uri = format!("/admin/orders/{order_id}");
    let payload = json!({ "status": "processing" });

    let response = app.request(Method::PATCH, &uri, Some(payload.clone())).await;
    assert_eq!(response.status(), 401);

    let response = app
        .request_with_cookie(
            Method::PATCH,
            &uri,
            Some(payload),
            "admin_session=wrong-secret",
        )
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn admin_update_validates_status_and_order() {
    let app = TestApp::new().await;
    let (order_id, _) = settle_order(&app, "PSK-tr-4", None).await;

    // Missing status
    let response = app
        .request_admin(
            Method::PATCH,
            &format!("/admin/orders/{order_id}"),
            Some(json!({ "note": "no status" })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Status is required"));

    // Unknown status
    let response = app
        .request_admin(
            Method::PATCH,
            &format!("/admin/orders/{order_id}"),
            Some(json!({ "status": "refunded" })),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Unknown order
    let response = app
        .request_admin(
            Method::PATCH,
            &format!("/admin/orders/{}", Uuid::new_v4()),
            Some(json!({ "status": "processing" })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn notified_reflects_contact_channels_on_file() {
    let app = TestApp::new().await;

    let (with_email, _) = settle_order(&app, "PSK-tr-5", Some("amaka@example.com")).await;
    let response = app
        .request_admin(
            Method::PATCH,
            &format!("/admin/orders/{with_email}"),
            Some(json!({ "status": "shipped" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["notified"], json!(true));
    assert_eq!(app.outbound.sent().len(), 1);

    let (without_contact, _) = settle_order(&app, "PSK-tr-6", None).await;
    let response = app
        .request_admin(
            Method::PATCH,
            &format!("/admin/orders/{without_contact}"),
            Some(json!({ "status": "shipped" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["notified"], json!(false));
}

#[tokio::test]
async fn admin_listing_returns_orders_newest_first() {
    let app = TestApp::new().await;
    settle_order(&app, "PSK-tr-7", None).await;
    let (_, latest_number) = settle_order(&app, "PSK-tr-8", None).await;

    let response = app
        .request_admin(Method::GET, "/admin/orders?page=1&limit=10", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["total"], json!(2));
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["order_number"], json!(latest_number));
}
