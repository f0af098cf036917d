pub mod admin;
pub mod delivery;
pub mod orders;
pub mod payment_webhooks;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::notifications::Notifier;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<crate::services::orders::OrderService>,
    pub order_status: Arc<crate::services::order_status::OrderStatusService>,
    pub payments: Arc<crate::services::payments::PaymentConfirmationService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        notifier: Arc<Notifier>,
        order_number_prefix: &str,
    ) -> Self {
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db.clone(),
            event_sender.clone(),
            order_number_prefix,
        ));
        let order_status = Arc::new(crate::services::order_status::OrderStatusService::new(
            db.clone(),
            event_sender.clone(),
            notifier.clone(),
        ));
        let payments = Arc::new(crate::services::payments::PaymentConfirmationService::new(
            db,
            event_sender,
            notifier,
        ));

        Self {
            orders,
            order_status,
            payments,
        }
    }
}
