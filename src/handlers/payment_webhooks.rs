use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::services::payments;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

/// Paystack payment webhook.
///
/// The signature is the only authentication on this endpoint, so it is
/// verified against the literal raw body bytes before any parsing. A
/// missing server secret fails closed with 500 so unsigned events are
/// never processed.
#[utoipa::path(
    post,
    path = "/payment-webhook",
    request_body = String,
    responses(
        (status = 200, description = "Event processed or ignored", body = WebhookAck),
        (status = 401, description = "Missing or invalid signature", body = crate::errors::ErrorResponse),
        (status = 500, description = "Webhook secret unconfigured or processing failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ServiceError> {
    let Some(secret) = state.config.paystack_webhook_secret.as_deref() else {
        error!("payment webhook received but no webhook secret is configured");
        return Err(ServiceError::InternalError(
            "payment webhook secret not configured".to_string(),
        ));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("payment webhook without signature header");
            ServiceError::Unauthorized("Missing webhook signature".to_string())
        })?;

    if !payments::verify_signature(secret, &body, signature) {
        warn!("payment webhook signature verification failed");
        return Err(ServiceError::Unauthorized(
            "Invalid webhook signature".to_string(),
        ));
    }

    state.services.payments.process(&body).await?;

    Ok(Json(WebhookAck { received: true }))
}
