use axum::{extract::State, Json};
use keyrelay_catalog::service::{ManagedService, ServiceKind};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::Caller;
use crate::state::AppState;

/// Customer-visible view of a listing. Supplier cost and connection details
/// never leave the server.
#[derive(Debug, Serialize)]
pub struct ServiceView {
    pub id: Uuid,
    pub name: String,
    pub kind: ServiceKind,
    pub price_cents: i64,
    pub min_quantity: i32,
    pub max_quantity: i32,
}

impl From<ManagedService> for ServiceView {
    fn from(service: ManagedService) -> Self {
        Self {
            id: service.id,
            name: service.name,
            kind: service.kind,
            price_cents: service.resale_price_cents,
            min_quantity: service.min_quantity,
            max_quantity: service.max_quantity,
        }
    }
}

/// GET /v1/services
/// Orderable catalog entries for the caller's tenant.
pub async fn list_services(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<ServiceView>>, AppError> {
    let services = state
        .catalog
        .list_enabled(caller.tenant_id)
        .await
        .map_err(|err| AppError::InternalServerError(err.to_string()))?;

    Ok(Json(services.into_iter().map(ServiceView::from).collect()))
}
