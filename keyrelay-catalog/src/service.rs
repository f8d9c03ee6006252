use chrono::{DateTime, Utc};
use keyrelay_shared::money::Cents;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a service needs from the customer before it can be submitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    /// Requires a device identifier (IMEI).
    Imei,
    /// Requires an uploaded file.
    File,
    /// No per-order input.
    Generic,
}

/// A tenant-scoped resale listing of an upstream supplier service.
///
/// Orders snapshot the fields they need at purchase time, so later edits to
/// a listing never affect existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedService {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub supplier_id: Uuid,
    /// Service id in the supplier's own catalog.
    pub supplier_service_id: String,
    pub name: String,
    pub kind: ServiceKind,
    /// What the supplier charges us.
    pub supplier_price_cents: Cents,
    /// What we charge the customer. Advisory-validated above cost at edit
    /// time; not re-enforced at order time.
    pub resale_price_cents: Cents,
    pub enabled: bool,
    pub min_quantity: i32,
    pub max_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ManagedService {
    /// Advisory margin check used by admin edit validation.
    pub fn has_positive_margin(&self) -> bool {
        self.resale_price_cents > self.supplier_price_cents
    }

    pub fn quantity_in_range(&self, quantity: i32) -> bool {
        quantity >= self.min_quantity && quantity <= self.max_quantity
    }
}
