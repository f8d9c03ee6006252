use async_trait::async_trait;
use keyrelay_shared::money::Cents;
use keyrelay_shared::pii::Masked;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decrypted connection parameters for one upstream supplier endpoint.
/// The key is wrapped so a stray debug log can never print it.
#[derive(Debug, Clone)]
pub struct SupplierCredentials {
    pub api_url: String,
    pub account: String,
    pub api_key: Masked<String>,
}

/// What the orchestrator submits upstream for one order.
#[derive(Debug, Clone)]
pub struct OrderSubmission {
    pub supplier_service_id: String,
    pub imei: Option<String>,
    pub file: Option<FileUpload>,
    /// Our order number, passed through as the supplier-side reference tag.
    pub reference: String,
}

/// File payload for file-based services (base64 body).
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub data: String,
}

/// Coarse fulfillment state derived from the supplier's loosely-typed
/// status string. Anything that is neither completed nor rejected is
/// treated as still in flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierOrderState {
    Completed,
    Rejected,
    Pending,
}

/// Uniform result shape for place/check calls. The raw upstream response is
/// preserved for the audit trail but its shape never leaks past the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSupplierResult {
    pub is_success: bool,
    pub supplier_order_id: Option<String>,
    pub reported_status: Option<String>,
    pub state: SupplierOrderState,
    pub result_code: Option<String>,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
    pub raw_response: Value,
}

impl NormalizedSupplierResult {
    /// Fulfillment finished with a deliverable result code.
    pub fn is_completed_with_code(&self) -> bool {
        self.state == SupplierOrderState::Completed && self.result_code.is_some()
    }
}

/// Account balance as reported by the supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierAccountBalance {
    pub balance: String,
    pub currency: Option<String>,
}

/// One entry of the supplier's service list, used by catalog sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierService {
    pub service_id: String,
    pub name: String,
    pub price_cents: Option<Cents>,
}

/// Client for a tenant's upstream unlocking supplier.
///
/// Implementations normalize the upstream API's inconsistent field naming
/// into `NormalizedSupplierResult` and raise only on transport failure;
/// supplier-reported failures come back as `is_success = false`.
#[async_trait]
pub trait SupplierGateway: Send + Sync {
    async fn place_order(
        &self,
        credentials: &SupplierCredentials,
        submission: &OrderSubmission,
    ) -> Result<NormalizedSupplierResult, Box<dyn std::error::Error + Send + Sync>>;

    async fn check_status(
        &self,
        credentials: &SupplierCredentials,
        supplier_order_id: &str,
    ) -> Result<NormalizedSupplierResult, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_balance(
        &self,
        credentials: &SupplierCredentials,
    ) -> Result<SupplierAccountBalance, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_services(
        &self,
        credentials: &SupplierCredentials,
    ) -> Result<Vec<SupplierService>, Box<dyn std::error::Error + Send + Sync>>;
}
