use crate::{
    entities::contact::{self, Entity as ContactEntity},
    entities::delivery_tracking::{self, Entity as DeliveryTrackingEntity},
    entities::order::{
        self, DeliveryAddress, Entity as OrderEntity, OrderSource, OrderStatus, PaymentStatus,
    },
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::product_variant::{self, Entity as ProductVariantEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::order_numbers,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, ExprTrait},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Checkout settlement input. Prices and quantities are taken from the
/// client as submitted; totals are recomputed server-side from these
/// lines, but no re-pricing against the catalog happens here.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderInput {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_whatsapp: Option<String>,
    pub delivery_address: DeliveryAddress,
    #[validate(nested)]
    pub items: Vec<OrderItemInput>,
    pub delivery_fee: Decimal,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub source: Option<OrderSource>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub yards_ordered: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedOrder {
    pub order_id: Uuid,
    pub order_number: String,
}

/// An order with its lines and shipment history, as needed by the public
/// tracking endpoint. Tracking events are newest-first.
#[derive(Debug)]
pub struct OrderTrackingData {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
    pub tracking: Vec<delivery_tracking::Model>,
}

#[derive(Debug)]
pub struct OrderPage {
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Order settlement and query service.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    order_number_prefix: String,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        order_number_prefix: impl Into<String>,
    ) -> Self {
        Self {
            db,
            event_sender,
            order_number_prefix: order_number_prefix.into(),
        }
    }

    /// Settles a checkout: order row, line items and stock decrements
    /// commit in a single transaction. The contact upsert runs after the
    /// commit and is best-effort. No email is sent here: the
    /// confirmation email is payment-gated and fires only from the
    /// webhook path.
    #[instrument(skip(self, input), fields(customer_name = %input.customer_name))]
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<CreatedOrder, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order items are required".to_string(),
            ));
        }
        input.validate()?;
        if input.items.iter().any(|i| i.unit_price < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "Unit price cannot be negative".to_string(),
            ));
        }
        if input.delivery_fee < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Delivery fee cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let subtotal: Decimal = input
            .items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();
        let total = subtotal + input.delivery_fee;

        let txn = self.db.begin().await?;

        let order_number =
            order_numbers::generate(&txn, &self.order_number_prefix).await?;

        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            customer_name: Set(input.customer_name.clone()),
            customer_email: Set(input.customer_email.clone()),
            customer_phone: Set(input.customer_phone.clone()),
            customer_whatsapp: Set(input.customer_whatsapp.clone()),
            delivery_address: Set(serde_json::to_value(&input.delivery_address)?),
            subtotal: Set(subtotal),
            delivery_fee: Set(input.delivery_fee),
            total: Set(total),
            payment_method: Set(input.payment_method.clone()),
            payment_reference: Set(input.payment_reference.clone()),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Unpaid),
            source: Set(input.source.unwrap_or(OrderSource::Website)),
            notes: Set(input.notes.clone()),
            created_at: Set(now),
        };
        order.insert(&txn).await?;

        for item in &input.items {
            let line = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                variant_id: Set(item.variant_id),
                product_name: Set(item.product_name.clone()),
                size: Set(item.size.clone()),
                color: Set(item.color.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                yards_ordered: Set(item.yards_ordered),
                created_at: Set(now),
            };
            line.insert(&txn).await?;
        }

        for item in &input.items {
            if let Some(variant_id) = item.variant_id {
                decrement_stock(&txn, variant_id, item.quantity, now).await?;
            }
        }

        txn.commit().await?;

        info!(
            order_id = %order_id,
            order_number = %order_number,
            %subtotal,
            %total,
            item_count = input.items.len(),
            "order settled"
        );

        if let Err(err) = self.upsert_contact(&input, now).await {
            warn!(error = %err, order_id = %order_id, "contact upsert failed after settlement");
        }

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        Ok(CreatedOrder {
            order_id,
            order_number,
        })
    }

    /// Retrieves an order by its surrogate id.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<order::Model>, ServiceError> {
        let order = OrderEntity::find_by_id(order_id).one(&*self.db).await?;
        Ok(order)
    }

    /// Public tracking lookup by order number. Tracking events come back
    /// newest-first for reverse-chronological display.
    #[instrument(skip(self))]
    pub async fn track_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderTrackingData>, ServiceError> {
        let Some(order) = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let items = order.find_related(OrderItemEntity).all(&*self.db).await?;
        let tracking = DeliveryTrackingEntity::find()
            .filter(delivery_tracking::Column::OrderId.eq(order.id))
            .order_by_desc(delivery_tracking::Column::UpdatedAt)
            .all(&*self.db)
            .await?;

        Ok(Some(OrderTrackingData {
            order,
            items,
            tracking,
        }))
    }

    /// Back-office listing, newest orders first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, page: u64, limit: u64) -> Result<OrderPage, ServiceError> {
        let paginator = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(OrderPage {
            orders,
            total,
            page,
            limit,
        })
    }

    /// Upserts the marketing contact for a settled order, keyed by email
    /// when present, else WhatsApp number.
    async fn upsert_contact(
        &self,
        input: &CreateOrderInput,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let email = normalized(input.customer_email.as_deref());
        let whatsapp = normalized(input.customer_whatsapp.as_deref());

        let existing = match (&email, &whatsapp) {
            (Some(e), _) => {
                ContactEntity::find()
                    .filter(contact::Column::Email.eq(e.clone()))
                    .one(&*self.db)
                    .await?
            }
            (None, Some(w)) => {
                ContactEntity::find()
                    .filter(contact::Column::Whatsapp.eq(w.clone()))
                    .one(&*self.db)
                    .await?
            }
            (None, None) => return Ok(()),
        };

        match existing {
            Some(model) => {
                let mut active: contact::ActiveModel = model.into();
                active.name = Set(Some(input.customer_name.clone()));
                if email.is_some() {
                    active.email = Set(email);
                }
                if whatsapp.is_some() {
                    active.whatsapp = Set(whatsapp);
                }
                active.updated_at = Set(now);
                active.update(&*self.db).await?;
            }
            None => {
                let active = contact::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(Some(input.customer_name.clone())),
                    email: Set(email),
                    whatsapp: Set(whatsapp),
                    source: Set("checkout".to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active.insert(&*self.db).await?;
            }
        }

        Ok(())
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Conditional atomic stock decrement with a zero floor.
///
/// The first update only matches while stock covers the requested
/// quantity; when it matches nothing, remaining stock is clamped to zero
/// and the shortfall is logged as a backorder. Checkout is never blocked
/// by stock.
async fn decrement_stock<C: ConnectionTrait>(
    db: &C,
    variant_id: Uuid,
    quantity: i32,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let applied = ProductVariantEntity::update_many()
        .col_expr(
            product_variant::Column::StockQuantity,
            Expr::col(product_variant::Column::StockQuantity).sub(quantity),
        )
        .col_expr(product_variant::Column::UpdatedAt, Expr::value(now))
        .filter(product_variant::Column::Id.eq(variant_id))
        .filter(product_variant::Column::StockQuantity.gte(quantity))
        .exec(db)
        .await?;

    if applied.rows_affected == 0 {
        let clamped = ProductVariantEntity::update_many()
            .col_expr(product_variant::Column::StockQuantity, Expr::value(0))
            .col_expr(product_variant::Column::UpdatedAt, Expr::value(now))
            .filter(product_variant::Column::Id.eq(variant_id))
            .filter(product_variant::Column::StockQuantity.lt(quantity))
            .exec(db)
            .await?;

        if clamped.rows_affected > 0 {
            warn!(
                variant_id = %variant_id,
                requested = quantity,
                "stock exhausted, clamped to zero (backorder)"
            );
        } else {
            warn!(variant_id = %variant_id, "variant missing during stock decrement");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input(items: Vec<OrderItemInput>) -> CreateOrderInput {
        CreateOrderInput {
            customer_name: "Amaka Obi".to_string(),
            customer_email: Some("amaka@example.com".to_string()),
            customer_phone: None,
            customer_whatsapp: None,
            delivery_address: DeliveryAddress::Pickup,
            items,
            delivery_fee: dec!(2500),
            payment_method: "paystack".to_string(),
            payment_reference: None,
            source: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn empty_items_fail_validation_before_touching_the_db() {
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        let service = OrderService::new(
            Arc::new(DatabaseConnection::Disconnected),
            Arc::new(EventSender::new(tx)),
            "ADR",
        );

        let err = service.create_order(sample_input(vec![])).await.unwrap_err();
        match err {
            ServiceError::ValidationError(msg) => {
                assert_eq!(msg, "Order items are required")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn negative_unit_price_is_rejected() {
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        let service = OrderService::new(
            Arc::new(DatabaseConnection::Disconnected),
            Arc::new(EventSender::new(tx)),
            "ADR",
        );

        let input = sample_input(vec![OrderItemInput {
            product_id: None,
            variant_id: None,
            product_name: "Adire two-piece".to_string(),
            size: None,
            color: None,
            quantity: 1,
            unit_price: dec!(-100),
            yards_ordered: None,
        }]);

        let err = service.create_order(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
