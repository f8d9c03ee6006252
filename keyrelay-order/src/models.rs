use chrono::{DateTime, Utc};
use keyrelay_catalog::service::ServiceKind;
use keyrelay_shared::money::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Order status in the lifecycle.
///
/// `Pending` covers both "reserved, not yet submitted" and "submitted,
/// awaiting fulfillment"; `Completed` and `Cancelled` are terminal.
/// The only transition out of the happy path is the compensation path to
/// `Cancelled`, which always refunds the reserved funds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(OrderStatus::Pending),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Per-order customer input, tagged by what the service kind requires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderInput {
    Imei {
        imei: String,
    },
    File {
        file_name: String,
        /// Base64-encoded file body, passed through to the supplier.
        file_data: String,
    },
    Generic,
}

/// Point-in-time snapshot of the ordered listing. Catalog edits after
/// purchase never reach existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub service_id: Uuid,
    pub service_name: String,
    pub service_kind: ServiceKind,
    pub supplier_service_id: String,
    pub quantity: i32,
    pub unit_price_cents: Cents,
    pub supplier_price_cents: Cents,
    pub input: OrderInput,
}

/// One purchase attempt. Created inside the reservation transaction,
/// mutated after the supplier call and on later status checks, never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    /// unit price x quantity, fixed at creation.
    pub total_cents: Cents,
    pub currency: String,
    pub status: OrderStatus,
    pub item: OrderItem,
    /// Correlation id at the supplier; once set it is never cleared.
    pub supplier_order_id: Option<String>,
    pub supplier_status: Option<String>,
    pub supplier_response: Option<Value>,
    pub supplier_error: Option<String>,
    pub unlock_code: Option<String>,
    /// Set once by the notification compare-and-swap so repeated status
    /// polls cannot double-send the unlock code.
    pub notified: bool,
    pub customer_id: Uuid,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        tenant_id: Uuid,
        customer_id: Uuid,
        order_number: String,
        item: OrderItem,
        currency: &str,
    ) -> Self {
        let now = Utc::now();
        let total_cents = item.unit_price_cents * Cents::from(item.quantity);
        Self {
            id: Uuid::new_v4(),
            order_number,
            total_cents,
            currency: currency.to_string(),
            status: OrderStatus::Pending,
            item,
            supplier_order_id: None,
            supplier_status: None,
            supplier_response: None,
            supplier_error: None,
            unlock_code: None,
            notified: false,
            customer_id,
            tenant_id,
            created_at: now,
            updated_at: now,
        }
    }
}
