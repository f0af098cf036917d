//! Adire API Library
//!
//! Order lifecycle and checkout settlement for the Adire storefront:
//! settlement, payment confirmation, delivery quoting, public tracking
//! and the back-office order surface.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Full route table. Layers (tracing, compression, CORS) are applied by
/// the binary.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Checkout settlement and public tracking
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/{order_number}", get(handlers::orders::track_order))
        // Delivery quoting
        .route(
            "/delivery/calculate",
            post(handlers::delivery::calculate_delivery),
        )
        // Payment provider webhook (signature-verified, not cookie-auth)
        .route(
            "/payment-webhook",
            post(handlers::payment_webhooks::payment_webhook),
        )
        // Back-office (session-cookie gated via the AdminSession extractor)
        .route("/admin/orders", get(handlers::admin::list_orders))
        .route(
            "/admin/orders/{id}",
            patch(handlers::admin::update_order_status),
        )
        // OpenAPI document
        .route("/api-docs/openapi.json", get(openapi::serve_openapi))
}

async fn root() -> &'static str {
    "adire-api up"
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<Value>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(json!({
        "status": db_status,
        "checks": { "database": db_status },
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
