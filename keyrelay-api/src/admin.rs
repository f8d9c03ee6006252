use axum::{
    extract::{Path, State},
    Json,
};
use keyrelay_catalog::supplier::Supplier;
use keyrelay_catalog::sync::plan_sync;
use keyrelay_core::supplier::SupplierCredentials;
use keyrelay_shared::pii::Masked;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::TenantCaller;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncSummary {
    pub created: usize,
    pub price_updates: usize,
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SupplierBalanceResponse {
    pub supplier_id: Uuid,
    pub balance: String,
    pub currency: Option<String>,
}

async fn supplier_for(
    state: &AppState,
    tenant_id: Uuid,
    supplier_id: Uuid,
) -> Result<(Supplier, SupplierCredentials), AppError> {
    let supplier = state
        .suppliers
        .get(tenant_id, supplier_id)
        .await
        .map_err(|err| AppError::InternalServerError(err.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("supplier not found".to_string()))?;

    let api_key = state
        .vault
        .decrypt(&supplier.api_key_enc)
        .map_err(|err| AppError::ConfigError(format!("supplier credentials unavailable: {err}")))?;

    let credentials = SupplierCredentials {
        api_url: supplier.api_url.clone(),
        account: supplier.account.clone(),
        api_key: Masked(api_key),
    };
    Ok((supplier, credentials))
}

/// POST /v1/admin/suppliers/{id}/sync
/// Pull the supplier's service list and reconcile the tenant catalog:
/// unknown services become disabled listings, known ones get their supplier
/// cost refreshed.
pub async fn sync_services(
    State(state): State<AppState>,
    caller: TenantCaller,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<SyncSummary>, AppError> {
    let (supplier, credentials) = supplier_for(&state, caller.tenant_id, supplier_id).await?;

    let fetched = state
        .gateway
        .list_services(&credentials)
        .await
        .map_err(|err| AppError::SupplierError(err.to_string()))?;

    let existing = state
        .catalog
        .list_for_supplier(caller.tenant_id, supplier.id)
        .await
        .map_err(|err| AppError::InternalServerError(err.to_string()))?;

    let plan = plan_sync(supplier.id, &existing, &fetched);
    state
        .catalog
        .apply_sync(caller.tenant_id, &plan.create, &plan.update_price)
        .await
        .map_err(|err| AppError::InternalServerError(err.to_string()))?;

    tracing::info!(
        tenant_id = %caller.tenant_id,
        supplier = %supplier.name,
        created = plan.create.len(),
        updated = plan.update_price.len(),
        "catalog sync applied"
    );

    Ok(Json(SyncSummary {
        created: plan.create.len(),
        price_updates: plan.update_price.len(),
        skipped: plan.skipped,
    }))
}

/// GET /v1/admin/suppliers/{id}/balance
/// Pass-through of the supplier's reported account balance.
pub async fn supplier_balance(
    State(state): State<AppState>,
    caller: TenantCaller,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<SupplierBalanceResponse>, AppError> {
    let (supplier, credentials) = supplier_for(&state, caller.tenant_id, supplier_id).await?;

    let balance = state
        .gateway
        .get_balance(&credentials)
        .await
        .map_err(|err| AppError::SupplierError(err.to_string()))?;

    Ok(Json(SupplierBalanceResponse {
        supplier_id: supplier.id,
        balance: balance.balance,
        currency: balance.currency,
    }))
}
