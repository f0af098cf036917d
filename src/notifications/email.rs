use super::{EmailChannel, NotificationError};
use crate::entities::{order, order_item};
use async_trait::async_trait;
use serde_json::json;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Transactional email via the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl EmailChannel for ResendMailer {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Provider(format!(
                "Resend returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

/// Order-confirmation email body, sent once after payment is verified.
pub fn confirmation_html(
    order: &order::Model,
    items: &[order_item::Model],
    tracking_link: &str,
) -> String {
    let mut rows = String::new();
    for item in items {
        let detail = [item.color.as_deref(), item.size.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
        let label = if detail.is_empty() {
            item.product_name.clone()
        } else {
            format!("{} ({})", item.product_name, detail)
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>&#8358;{}</td></tr>",
            label,
            item.quantity,
            item.line_total()
        ));
    }

    format!(
        "<h2>Thank you, {name}!</h2>\
         <p>Your payment for order <strong>{number}</strong> has been confirmed.</p>\
         <table><tr><th>Item</th><th>Qty</th><th>Amount</th></tr>{rows}</table>\
         <p>Delivery fee: &#8358;{delivery_fee}<br/>Total: <strong>&#8358;{total}</strong></p>\
         <p><a href=\"{link}\">Track your order</a></p>",
        name = order.customer_name,
        number = order.order_number,
        rows = rows,
        delivery_fee = order.delivery_fee,
        total = order.total,
        link = tracking_link,
    )
}

/// Status-update email body used by the admin dispatch path.
pub fn status_update_html(
    order: &order::Model,
    phrase: &str,
    note: Option<&str>,
    tracking_link: &str,
) -> String {
    let note_block = note
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| format!("<p><em>{}</em></p>", n))
        .unwrap_or_default();

    format!(
        "<h2>Hello {name},</h2>\
         <p>An update on order <strong>{number}</strong>: {phrase}</p>\
         {note_block}\
         <p><a href=\"{link}\">Track your order</a></p>",
        name = order.customer_name,
        number = order.order_number,
        phrase = phrase,
        note_block = note_block,
        link = tracking_link,
    )
}
