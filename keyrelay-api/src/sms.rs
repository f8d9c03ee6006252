use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::identity::TenantCaller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub message_length: usize,
    pub encoding: keyrelay_notify::encoding::SmsEncoding,
    pub segments: u32,
    pub cost_per_segment_cents: i64,
    pub total_cost_cents: i64,
    pub non_standard_chars: Vec<char>,
    pub can_afford: bool,
    pub balance_cents: i64,
}

/// POST /v1/sms/estimate
/// Price a message against the tenant's ledger without sending it.
pub async fn estimate_cost(
    State(state): State<AppState>,
    caller: TenantCaller,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    let estimate = state
        .dispatcher
        .estimate(caller.tenant_id, &request.message)
        .await
        .map_err(|err| AppError::InternalServerError(err.to_string()))?;

    Ok(Json(EstimateResponse {
        message_length: estimate.breakdown.message_length,
        encoding: estimate.breakdown.encoding,
        segments: estimate.breakdown.segments,
        cost_per_segment_cents: estimate.breakdown.cost_per_segment_cents,
        total_cost_cents: estimate.breakdown.total_cost_cents,
        non_standard_chars: estimate.breakdown.non_standard_chars.clone(),
        can_afford: estimate.can_afford,
        balance_cents: estimate.balance_cents,
    }))
}
