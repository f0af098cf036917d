use axum::response::Json;
use utoipa::OpenApi;

use crate::entities::delivery_tracking::TrackingActor;
use crate::entities::order::{DeliveryAddress, OrderSource, OrderStatus, PaymentStatus};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Adire API",
        description = "Checkout settlement, payment confirmation, delivery quoting and order tracking for the Adire storefront"
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::track_order,
        crate::handlers::delivery::calculate_delivery,
        crate::handlers::payment_webhooks::payment_webhook,
        crate::handlers::admin::update_order_status,
        crate::handlers::admin::list_orders,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::orders::CreateOrderInput,
        crate::services::orders::OrderItemInput,
        crate::handlers::orders::CreateOrderResponse,
        crate::handlers::orders::TrackOrderResponse,
        crate::handlers::orders::PublicOrder,
        crate::handlers::orders::PublicOrderItem,
        crate::handlers::orders::PublicTrackingEvent,
        crate::handlers::delivery::DeliveryQuoteRequest,
        crate::handlers::delivery::DeliveryQuoteResponse,
        crate::services::delivery::DeliveryOption,
        crate::handlers::payment_webhooks::WebhookAck,
        crate::handlers::admin::UpdateStatusRequest,
        crate::handlers::admin::UpdateStatusResponse,
        crate::handlers::admin::AdminOrderSummary,
        crate::handlers::admin::AdminOrderListResponse,
        OrderStatus,
        PaymentStatus,
        OrderSource,
        DeliveryAddress,
        TrackingActor,
    )),
    tags(
        (name = "Orders", description = "Checkout settlement and public tracking"),
        (name = "Delivery", description = "Delivery fee quoting"),
        (name = "Payments", description = "Payment provider webhooks"),
        (name = "Admin", description = "Back-office order management")
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI document.
pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
