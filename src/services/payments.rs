use crate::{
    entities::delivery_tracking::{self, TrackingActor},
    entities::order::{self, Entity as OrderEntity, OrderStatus, PaymentStatus},
    entities::order_item::Entity as OrderItemEntity,
    entities::payment_event::{self, Entity as PaymentEventEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::Notifier,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::Value;
use sha2::Sha512;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

type HmacSha512 = Hmac<Sha512>;

const CHARGE_SUCCESS: &str = "charge.success";

/// Verifies a Paystack webhook signature: HMAC-SHA512 over the literal
/// raw request bytes, hex-encoded, compared in constant time.
///
/// Verification must run on the raw byte stream before any JSON parsing;
/// re-serialization can change byte layout and invalidate the signature.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, signature)
}

pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Processes verified payment-provider webhooks.
#[derive(Clone)]
pub struct PaymentConfirmationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    notifier: Arc<Notifier>,
}

impl PaymentConfirmationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            db,
            event_sender,
            notifier,
        }
    }

    /// Handles one verified webhook delivery.
    ///
    /// Only `charge.success` mutates anything; every other event type is
    /// acknowledged and ignored. Redelivered events short-circuit on the
    /// processed-event ledger, and a reference matching no order is a
    /// no-op: the provider retries non-2xx responses, and neither case
    /// is retryable into a different outcome.
    #[instrument(skip(self, payload))]
    pub async fn process(&self, payload: &[u8]) -> Result<(), ServiceError> {
        let event: Value = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::BadRequest(format!("invalid webhook payload: {}", e)))?;

        let event_type = event.get("event").and_then(Value::as_str).unwrap_or("");
        if event_type != CHARGE_SUCCESS {
            info!(event_type, "ignoring payment webhook event");
            return Ok(());
        }

        let data = event.get("data").cloned().unwrap_or(Value::Null);
        let Some(reference) = data.get("reference").and_then(Value::as_str) else {
            warn!("charge.success event without a reference");
            return Ok(());
        };

        let event_key = data
            .get("id")
            .and_then(Value::as_i64)
            .map(|id| format!("paystack:{}", id))
            .unwrap_or_else(|| format!("{}:{}", reference, event_type));

        let already_processed = PaymentEventEntity::find()
            .filter(payment_event::Column::ProviderEventKey.eq(&event_key))
            .one(&*self.db)
            .await?
            .is_some();
        if already_processed {
            info!(event_key, "webhook event already processed");
            return Ok(());
        }

        let Some(order) = OrderEntity::find()
            .filter(order::Column::PaymentReference.eq(reference))
            .one(&*self.db)
            .await?
        else {
            info!(reference, "no order matches payment reference");
            return Ok(());
        };

        let now = Utc::now();
        let order_id = order.id;

        let txn = self.db.begin().await?;

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::Paid);
        active.status = Set(OrderStatus::Confirmed);
        let confirmed = active.update(&txn).await?;

        let tracking = delivery_tracking::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(OrderStatus::Confirmed.to_string()),
            note: Set(Some("Payment confirmed via Paystack".to_string())),
            updated_at: Set(now),
            updated_by: Set(TrackingActor::System),
        };
        tracking.insert(&txn).await?;

        let ledger = payment_event::ActiveModel {
            id: Set(Uuid::new_v4()),
            provider_event_key: Set(event_key),
            reference: Set(reference.to_string()),
            event_type: Set(event_type.to_string()),
            received_at: Set(now),
        };
        ledger.insert(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, reference, "payment confirmed");

        // The ledger row above guarantees this fires at most once per
        // event, so an email failure is logged rather than surfaced;
        // a provider retry would short-circuit before reaching it anyway.
        if confirmed.customer_email.is_some() {
            let items = confirmed.find_related(OrderItemEntity).all(&*self.db).await?;
            if let Err(err) = self.notifier.order_confirmation(&confirmed, &items).await {
                warn!(error = %err, order_id = %order_id, "confirmation email failed");
            }
        }

        self.event_sender
            .send_or_log(Event::PaymentConfirmed(order_id))
            .await;

        Ok(())
    }
}
