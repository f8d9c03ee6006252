use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant-scoped upstream supplier connection.
///
/// The API key is stored as vault ciphertext; decryption happens only on
/// the call path that actually needs the secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub api_url: String,
    pub account: String,
    pub api_key_enc: String,
    pub active: bool,
    /// Higher wins; ties broken by ascending id.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}
