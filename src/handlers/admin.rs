use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts},
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order::{self, OrderSource, OrderStatus, PaymentStatus};
use crate::errors::ServiceError;
use crate::services::payments::constant_time_eq;
use crate::{AppState, ListQuery};

const ADMIN_COOKIE: &str = "admin_session";

/// Proof that the request carried the back-office session cookie.
///
/// The cookie value is compared in constant time against the configured
/// shared secret; an unset secret disables the whole admin surface. The
/// rejection never reveals whether the targeted resource exists.
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config.admin_session_secret.as_deref() else {
            warn!("admin request rejected: admin surface disabled");
            return Err(ServiceError::Unauthorized("Invalid session".to_string()));
        };

        let cookie_header = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let presented = cookie_header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == ADMIN_COOKIE).then_some(value)
        });

        match presented {
            Some(value) if constant_time_eq(value, secret) => Ok(AdminSession),
            _ => Err(ServiceError::Unauthorized("Invalid session".to_string())),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateStatusResponse {
    pub success: bool,
    /// Whether any customer notification channel was attempted.
    pub notified: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_whatsapp: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Decimal,
    pub source: OrderSource,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderListResponse {
    pub success: bool,
    pub orders: Vec<AdminOrderSummary>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Set an order's status and notify the customer.
#[utoipa::path(
    patch,
    path = "/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = UpdateStatusResponse),
        (status = 400, description = "Missing or unknown status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid session cookie", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, ServiceError> {
    let raw_status = request
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::ValidationError("Status is required".to_string()))?;

    let new_status = OrderStatus::from_str(raw_status)
        .map_err(|_| ServiceError::InvalidStatus(format!("Unknown order status: {raw_status}")))?;

    let outcome = state
        .services
        .order_status
        .update_status(id, new_status, request.note)
        .await?;

    Ok(Json(UpdateStatusResponse {
        success: true,
        notified: outcome.notified,
    }))
}

/// Back-office order listing, newest first.
#[utoipa::path(
    get,
    path = "/admin/orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)")
    ),
    responses(
        (status = 200, description = "Orders", body = AdminOrderListResponse),
        (status = 401, description = "Missing or invalid session cookie", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<AdminOrderListResponse>, ServiceError> {
    let page = state
        .services
        .orders
        .list_orders(query.page, query.limit)
        .await?;

    Ok(Json(AdminOrderListResponse {
        success: true,
        orders: page.orders.into_iter().map(to_summary).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
    }))
}

fn to_summary(order: order::Model) -> AdminOrderSummary {
    AdminOrderSummary {
        id: order.id,
        order_number: order.order_number,
        customer_name: order.customer_name,
        customer_email: order.customer_email,
        customer_whatsapp: order.customer_whatsapp,
        status: order.status,
        payment_status: order.payment_status,
        total: order.total,
        source: order.source,
        created_at: order.created_at,
    }
}
