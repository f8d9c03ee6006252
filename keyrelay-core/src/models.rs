use chrono::{DateTime, Utc};
use keyrelay_shared::money::Cents;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An end customer of a tenant. Owns a prepaid balance that orders debit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub sms_enabled: bool,
    pub balance_cents: Cents,
    pub created_at: DateTime<Utc>,
}

/// A tenant (white-labeled reseller). Owns the catalog, the suppliers and
/// the prepaid SMS ledger for its customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub company_name: String,
    pub sms_enabled: bool,
    pub sms_sender_id: Option<String>,
    /// Vault ciphertext; decrypted only at dispatch time.
    pub sms_api_key_enc: Option<String>,
    /// Per-segment price charged against the SMS ledger. Zero means
    /// "use the platform default" from configuration.
    pub sms_cost_per_segment_cents: Cents,
    pub sms_balance_cents: Cents,
}

impl Tenant {
    /// Per-segment SMS price, falling back to the platform default when the
    /// tenant has no explicit price configured.
    pub fn sms_unit_price(&self, default_cents: Cents) -> Cents {
        if self.sms_cost_per_segment_cents > 0 {
            self.sms_cost_per_segment_cents
        } else {
            default_cents
        }
    }
}
