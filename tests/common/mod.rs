//! Shared test harness: an in-process app over SQLite in-memory with
//! migrations applied and recording notification channels.
#![allow(dead_code)]

use adire_api::config::AppConfig;
use adire_api::entities::product_variant;
use adire_api::events::EventSender;
use adire_api::handlers::AppServices;
use adire_api::migrator::Migrator;
use adire_api::notifications::{EmailChannel, InMemoryChannel, MessageChannel, Notifier};
use adire_api::AppState;
use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use sha2::Sha512;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_SECRET: &str = "test-admin-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub outbound: Arc<InMemoryChannel>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::new_with(|_| {}).await
    }

    pub async fn new_with(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig {
            admin_session_secret: Some(ADMIN_SECRET.to_string()),
            paystack_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            tracking_base_url: "https://adire.test/track".to_string(),
            ..AppConfig::default()
        };
        customize(&mut config);

        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1);
        let db = Database::connect(opts).await.expect("sqlite connection");
        Migrator::up(&db, None).await.expect("migrations");
        let db = Arc::new(db);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(adire_api::events::process_events(event_rx));

        let outbound = Arc::new(InMemoryChannel::new());
        let notifier = Arc::new(Notifier::new(
            Some(outbound.clone() as Arc<dyn EmailChannel>),
            Some(outbound.clone() as Arc<dyn MessageChannel>),
            config.tracking_base_url.clone(),
        ));

        let services = AppServices::new(
            db.clone(),
            Arc::new(event_sender.clone()),
            notifier,
            &config.order_number_prefix,
        );

        let state = AppState {
            db,
            config,
            event_sender,
            services,
        };
        let router = adire_api::api_routes().with_state(state.clone());

        Self {
            state,
            router,
            outbound,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    pub async fn request_admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.request_with_cookie(method, uri, body, &format!("admin_session={ADMIN_SECRET}"))
            .await
    }

    pub async fn request_with_cookie(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: &str,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    /// Posts a raw webhook body, optionally signed.
    pub async fn post_webhook(&self, body: &[u8], signature: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/payment-webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header("x-paystack-signature", signature);
        }

        self.router
            .clone()
            .oneshot(builder.body(Body::from(body.to_vec())).expect("request"))
            .await
            .expect("response")
    }

    pub async fn seed_variant(
        &self,
        sku: &str,
        price: Decimal,
        stock: i32,
    ) -> product_variant::Model {
        let now = Utc::now();
        let variant = product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(Uuid::new_v4()),
            sku: Set(sku.to_string()),
            name: Set(format!("Adire wrap {sku}")),
            color: Set(Some("indigo".to_string())),
            size: Set(None),
            price: Set(price),
            stock_quantity: Set(stock),
            created_at: Set(now),
            updated_at: Set(now),
        };
        variant
            .insert(&*self.state.db)
            .await
            .expect("seed variant")
    }
}

/// HMAC-SHA512 hex signature over the exact body bytes, as the payment
/// provider computes it.
pub fn sign_webhook(body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha512>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("hmac accepts any key");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
