use axum::{
    extract::{Path, State},
    Json,
};
use keyrelay_notify::dispatcher::DispatchOutcome;
use keyrelay_order::models::{Order, OrderInput, OrderStatus};
use keyrelay_order::orchestrator::NewOrderRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::Caller;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub service_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub imei: Option<String>,
    pub file: Option<FilePayload>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct FilePayload {
    pub name: String,
    /// Base64-encoded body.
    pub data: String,
}

impl PlaceOrderRequest {
    fn into_new_order(self) -> NewOrderRequest {
        let input = if let Some(imei) = self.imei {
            OrderInput::Imei { imei }
        } else if let Some(file) = self.file {
            OrderInput::File {
                file_name: file.name,
                file_data: file.data,
            }
        } else {
            OrderInput::Generic
        };
        NewOrderRequest {
            service_id: self.service_id,
            quantity: self.quantity,
            input,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order: OrderSummary,
    pub notification: Option<NotificationSummary>,
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub currency: String,
    pub service_name: String,
    pub supplier_order_id: Option<String>,
    pub code: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            total_cents: order.total_cents,
            currency: order.currency.clone(),
            service_name: order.item.service_name.clone(),
            supplier_order_id: order.supplier_order_id.clone(),
            code: order.unlock_code.clone(),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationSummary {
    pub sent: bool,
    pub skipped: bool,
    pub warnings: Vec<String>,
}

impl From<&DispatchOutcome> for NotificationSummary {
    fn from(outcome: &DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Sent { warnings, .. } => Self {
                sent: true,
                skipped: false,
                warnings: warnings.clone(),
            },
            DispatchOutcome::Skipped { reason } => Self {
                sent: false,
                skipped: true,
                warnings: vec![reason.to_string()],
            },
            DispatchOutcome::Failed { error, warnings, .. } => {
                let mut warnings = warnings.clone();
                warnings.push(error.clone());
                Self {
                    sent: false,
                    skipped: false,
                    warnings,
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub order_number: String,
    pub status: OrderStatus,
    pub supplier_status: Option<String>,
    pub code: Option<String>,
    pub submitted: bool,
    pub refunded: bool,
    pub notification: Option<NotificationSummary>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Place an order against the caller's catalog and balance.
pub async fn place_order(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>, AppError> {
    let placed = state
        .orchestrator
        .place_order(caller.tenant_id, caller.customer_id, request.into_new_order())
        .await?;

    Ok(Json(PlaceOrderResponse {
        success: true,
        order: OrderSummary::from(&placed.order),
        notification: placed.notification.as_ref().map(NotificationSummary::from),
    }))
}

/// GET /v1/orders/{id}/status
/// Re-check fulfillment with the supplier and report the latest state.
pub async fn order_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let report = state
        .orchestrator
        .check_order_status(caller.tenant_id, caller.customer_id, order_id)
        .await?;

    Ok(Json(StatusResponse {
        order_number: report.order_number,
        status: report.status,
        supplier_status: report.supplier_status,
        code: report.unlock_code,
        submitted: report.submitted,
        refunded: report.refunded,
        notification: report.notification.as_ref().map(NotificationSummary::from),
    }))
}

/// GET /v1/orders
/// The caller's order history, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let orders = state
        .orchestrator
        .list_orders(caller.tenant_id, caller.customer_id)
        .await?;

    Ok(Json(orders.iter().map(OrderSummary::from).collect()))
}
