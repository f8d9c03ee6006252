use crate::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

// The authentication layer in front of this service resolves the session and
// installs the caller's identity as headers; these extractors only parse
// them.
const TENANT_HEADER: &str = "x-tenant-id";
const CUSTOMER_HEADER: &str = "x-customer-id";

/// A customer acting within their tenant.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
}

/// A tenant-scoped (admin) caller with no customer context.
#[derive(Debug, Clone, Copy)]
pub struct TenantCaller {
    pub tenant_id: Uuid,
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, AppError> {
    let raw = parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::ValidationError(format!("missing {name} header")))?;
    Uuid::parse_str(raw).map_err(|_| AppError::ValidationError(format!("invalid {name} header")))
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller {
            tenant_id: header_uuid(parts, TENANT_HEADER)?,
            customer_id: header_uuid(parts, CUSTOMER_HEADER)?,
        })
    }
}

impl<S> FromRequestParts<S> for TenantCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(TenantCaller {
            tenant_id: header_uuid(parts, TENANT_HEADER)?,
        })
    }
}
