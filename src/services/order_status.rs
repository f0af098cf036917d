use crate::{
    entities::delivery_tracking::{self, TrackingActor},
    entities::order::{self, Entity as OrderEntity, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::Notifier,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct StatusUpdateOutcome {
    /// Whether any notification channel was attempted (not whether it
    /// succeeded): the customer had an email or WhatsApp number on file.
    pub notified: bool,
}

/// Admin-driven status transitions with tracking append and best-effort
/// notification fan-out.
#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    notifier: Arc<Notifier>,
}

impl OrderStatusService {
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

    /// Sets a new status, appends the tracking event, then fans out
    /// notifications concurrently.
    ///
    /// The transition graph is deliberately not validated; the admin is
    /// trusted. Only the status/tracking write can fail the operation;
    /// each notification channel is isolated, and a failure there is
    /// logged and swallowed so status changes never get stuck behind
    /// flaky third-party messaging.
    #[instrument(skip(self, note), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        note: Option<String>,
    ) -> Result<StatusUpdateOutcome, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let old_status = order.status;
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        let updated = active.update(&txn).await?;

        let tracking = delivery_tracking::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(new_status.to_string()),
            note: Set(note.clone()),
            updated_at: Set(now),
            updated_by: Set(TrackingActor::Admin),
        };
        tracking.insert(&txn).await?;

        txn.commit().await?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %new_status,
            "order status updated"
        );

        let has_email = updated.customer_email.is_some();
        let has_whatsapp = updated.customer_whatsapp.is_some();

        let email_task = async {
            if let Err(err) = self
                .notifier
                .status_email(&updated, new_status, note.as_deref())
                .await
            {
                warn!(error = %err, order_id = %order_id, "status email failed");
            }
        };
        let whatsapp_task = async {
            if let Err(err) = self
                .notifier
                .status_whatsapp(&updated, new_status, note.as_deref())
                .await
            {
                warn!(error = %err, order_id = %order_id, "status WhatsApp message failed");
            }
        };
        tokio::join!(email_task, whatsapp_task);

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            })
            .await;

        Ok(StatusUpdateOutcome {
            notified: has_email || has_whatsapp,
        })
    }
}
