use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::delivery_tracking::{self, TrackingActor};
use crate::entities::order::{self, DeliveryAddress, OrderStatus, PaymentStatus};
use crate::entities::order_item;
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderInput, OrderTrackingData};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_number: String,
    pub order_id: Uuid,
}

/// Public view of an order: status and money fields only, never the
/// stored contact details. Anyone who knows an order number can call
/// the tracking endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicOrder {
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub delivery_address: DeliveryAddress,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicOrderItem {
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub yards_ordered: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicTrackingEvent {
    pub status: String,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: TrackingActor,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackOrderResponse {
    pub success: bool,
    pub order: PublicOrder,
    pub items: Vec<PublicOrderItem>,
    /// Newest-first, for reverse-chronological timelines.
    pub tracking: Vec<PublicTrackingEvent>,
}

/// Settle a checkout into a pending, unpaid order.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderInput,
    responses(
        (status = 200, description = "Order settled", body = CreateOrderResponse),
        (status = 400, description = "Empty or invalid order items", body = crate::errors::ErrorResponse),
        (status = 500, description = "Persistence failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> Result<Json<CreateOrderResponse>, ServiceError> {
    let created = state.services.orders.create_order(input).await?;
    Ok(Json(CreateOrderResponse {
        success: true,
        order_number: created.order_number,
        order_id: created.order_id,
    }))
}

/// Public order tracking by order number.
#[utoipa::path(
    get,
    path = "/orders/{order_number}",
    params(("order_number" = String, Path, description = "Human-facing order number")),
    responses(
        (status = 200, description = "Order found", body = TrackOrderResponse),
        (status = 404, description = "Unknown order number", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn track_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<TrackOrderResponse>, ServiceError> {
    let data = state
        .services
        .orders
        .track_by_number(&order_number)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

    Ok(Json(to_tracking_response(data)?))
}

fn to_tracking_response(data: OrderTrackingData) -> Result<TrackOrderResponse, ServiceError> {
    let OrderTrackingData {
        order,
        items,
        tracking,
    } = data;

    Ok(TrackOrderResponse {
        success: true,
        order: to_public_order(order)?,
        items: items.into_iter().map(to_public_item).collect(),
        tracking: tracking.into_iter().map(to_public_event).collect(),
    })
}

fn to_public_order(order: order::Model) -> Result<PublicOrder, ServiceError> {
    let delivery_address: DeliveryAddress = serde_json::from_value(order.delivery_address)?;
    Ok(PublicOrder {
        order_number: order.order_number,
        status: order.status,
        payment_status: order.payment_status,
        subtotal: order.subtotal,
        delivery_fee: order.delivery_fee,
        total: order.total,
        delivery_address,
        created_at: order.created_at,
    })
}

fn to_public_item(item: order_item::Model) -> PublicOrderItem {
    PublicOrderItem {
        product_name: item.product_name,
        size: item.size,
        color: item.color,
        quantity: item.quantity,
        unit_price: item.unit_price,
        yards_ordered: item.yards_ordered,
    }
}

fn to_public_event(event: delivery_tracking::Model) -> PublicTrackingEvent {
    PublicTrackingEvent {
        status: event.status,
        note: event.note,
        updated_at: event.updated_at,
        updated_by: event.updated_by,
    }
}
