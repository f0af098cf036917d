use axum::{extract::State, response::Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::services::delivery::{self, DeliveryOption};
use crate::AppState;

/// Quote request. `city` and `subtotal` are accepted for forward
/// compatibility with zone- or basket-based pricing; the current policy
/// table keys only on country and state.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeliveryQuoteRequest {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub subtotal: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryQuoteResponse {
    pub options: Vec<DeliveryOption>,
}

/// Quote delivery options for a destination.
#[utoipa::path(
    post,
    path = "/delivery/calculate",
    request_body = DeliveryQuoteRequest,
    responses(
        (status = 200, description = "Available delivery options", body = DeliveryQuoteResponse)
    ),
    tag = "Delivery"
)]
pub async fn calculate_delivery(
    State(_state): State<AppState>,
    Json(request): Json<DeliveryQuoteRequest>,
) -> Result<Json<DeliveryQuoteResponse>, ServiceError> {
    let options = delivery::quote(request.country.as_deref(), request.state.as_deref());
    Ok(Json(DeliveryQuoteResponse { options }))
}
