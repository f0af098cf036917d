//! Customer notification fan-out.
//!
//! Channels are trait objects so the HTTP-backed providers can be swapped
//! for the in-memory channel in tests. A channel that is not configured is
//! skipped with a warning; notification failures are logged by callers and
//! never fail the operation that triggered them.

pub mod email;
pub mod whatsapp;

use crate::config::AppConfig;
use crate::entities::order::{self, OrderStatus};
use crate::entities::order_item;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

pub use email::ResendMailer;
pub use whatsapp::WhatsappCloudClient;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider rejected the request: {0}")]
    Provider(String),
}

#[async_trait]
pub trait EmailChannel: Send + Sync {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), NotificationError>;
}

#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), NotificationError>;
}

/// Customer-facing phrase for a status update.
///
/// Exhaustive by construction: adding a status without a phrase is a
/// compile error, not a silent fallback.
pub fn status_phrase(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Your order has been received and is awaiting confirmation.",
        OrderStatus::Confirmed => "Your order is confirmed! We are getting it ready.",
        OrderStatus::Processing => "Your order is being prepared and will ship soon.",
        OrderStatus::Shipped => "Your order is on its way!",
        OrderStatus::Delivered => {
            "Your order has been delivered. Thank you for shopping with Adire!"
        }
        OrderStatus::Cancelled => {
            "Your order has been cancelled. Reach out to us if this is unexpected."
        }
    }
}

/// Dispatches customer notifications over whichever channels are
/// configured.
pub struct Notifier {
    email: Option<Arc<dyn EmailChannel>>,
    whatsapp: Option<Arc<dyn MessageChannel>>,
    tracking_base_url: String,
}

impl Notifier {
    pub fn new(
        email: Option<Arc<dyn EmailChannel>>,
        whatsapp: Option<Arc<dyn MessageChannel>>,
        tracking_base_url: impl Into<String>,
    ) -> Self {
        Self {
            email,
            whatsapp,
            tracking_base_url: tracking_base_url.into(),
        }
    }

    /// Builds channels from provider credentials; missing credentials
    /// disable the channel with a warning.
    pub fn from_config(cfg: &AppConfig) -> Self {
        let email: Option<Arc<dyn EmailChannel>> = match &cfg.resend_api_key {
            Some(key) => Some(Arc::new(ResendMailer::new(
                key.clone(),
                cfg.email_from.clone(),
            ))),
            None => {
                warn!("Resend API key not configured; email notifications disabled");
                None
            }
        };

        let whatsapp: Option<Arc<dyn MessageChannel>> =
            match (&cfg.whatsapp_token, &cfg.whatsapp_phone_id) {
                (Some(token), Some(phone_id)) => Some(Arc::new(WhatsappCloudClient::new(
                    token.clone(),
                    phone_id.clone(),
                ))),
                _ => {
                    warn!("WhatsApp credentials not configured; WhatsApp notifications disabled");
                    None
                }
            };

        Self::new(email, whatsapp, cfg.tracking_base_url.clone())
    }

    pub fn tracking_link(&self, order_number: &str) -> String {
        format!("{}/{}", self.tracking_base_url.trim_end_matches('/'), order_number)
    }

    /// Sends the order-confirmation email. Only the payment-confirmation
    /// path calls this, so the email fires exactly once, after payment.
    pub async fn order_confirmation(
        &self,
        order: &order::Model,
        items: &[order_item::Model],
    ) -> Result<(), NotificationError> {
        let Some(channel) = &self.email else {
            warn!(order_number = %order.order_number, "skipping confirmation email: channel disabled");
            return Ok(());
        };
        let Some(to) = &order.customer_email else {
            return Ok(());
        };

        let subject = format!("Order {} confirmed", order.order_number);
        let html = email::confirmation_html(order, items, &self.tracking_link(&order.order_number));
        channel.send_email(to, &subject, &html).await
    }

    pub async fn status_email(
        &self,
        order: &order::Model,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<(), NotificationError> {
        let Some(channel) = &self.email else {
            warn!(order_number = %order.order_number, "skipping status email: channel disabled");
            return Ok(());
        };
        let Some(to) = &order.customer_email else {
            return Ok(());
        };

        let subject = format!("Order {} update: {}", order.order_number, status);
        let html = email::status_update_html(
            order,
            status_phrase(status),
            note,
            &self.tracking_link(&order.order_number),
        );
        channel.send_email(to, &subject, &html).await
    }

    pub async fn status_whatsapp(
        &self,
        order: &order::Model,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<(), NotificationError> {
        let Some(channel) = &self.whatsapp else {
            warn!(order_number = %order.order_number, "skipping WhatsApp update: channel disabled");
            return Ok(());
        };
        let Some(to) = &order.customer_whatsapp else {
            return Ok(());
        };

        let mut text = format!(
            "Hello {}! Order {}: {}",
            order.customer_name,
            order.order_number,
            status_phrase(status)
        );
        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            text.push_str("\nNote: ");
            text.push_str(note);
        }
        text.push_str("\nTrack your order: ");
        text.push_str(&self.tracking_link(&order.order_number));

        channel.send_text(to, &text).await
    }
}

/// Recording channel for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    sent: Mutex<Vec<OutboundMessage>>,
}

#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub to: String,
    /// `Some` for email, `None` for text messages.
    pub subject: Option<String>,
    pub body: String,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("channel lock poisoned").clone()
    }
}

#[async_trait]
impl EmailChannel for InMemoryChannel {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), NotificationError> {
        self.sent.lock().expect("channel lock poisoned").push(OutboundMessage {
            to: to.to_string(),
            subject: Some(subject.to_string()),
            body: html.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for InMemoryChannel {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), NotificationError> {
        self.sent.lock().expect("channel lock poisoned").push(OutboundMessage {
            to: to.to_string(),
            subject: None,
            body: text.to_string(),
        });
        Ok(())
    }
}
