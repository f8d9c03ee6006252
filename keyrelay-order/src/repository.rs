use crate::models::{Order, OrderStatus};
use async_trait::async_trait;
use keyrelay_shared::money::Cents;
use serde_json::Value;
use uuid::Uuid;

/// Result of the atomic reservation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Balance debited and order row created.
    Created,
    /// Balance did not cover the total; nothing was persisted.
    InsufficientFunds { balance_cents: Cents },
}

/// Fields written back after a supplier call (placement or status check).
#[derive(Debug, Clone)]
pub struct SupplierUpdate {
    pub status: OrderStatus,
    pub supplier_order_id: Option<String>,
    pub supplier_status: Option<String>,
    pub unlock_code: Option<String>,
    pub raw_response: Value,
}

/// Repository trait for order data access.
///
/// The compound operations bundle the balance mutation and the order write
/// into a single storage transaction; the orchestrator never does
/// read-modify-write on balances itself.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// In one transaction: conditionally debit the customer's balance by
    /// `order.total_cents` and insert the order in its pending state. The
    /// debit is a conditional decrement, so two concurrent reservations can
    /// never overdraw the same funds.
    async fn reserve_and_create(
        &self,
        order: &Order,
    ) -> Result<ReserveOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>>;

    /// Persist the outcome of a supplier call. The supplier correlation id
    /// is only ever set, never cleared.
    async fn record_supplier_result(
        &self,
        order_id: Uuid,
        update: &SupplierUpdate,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// In one transaction: move the order to `Cancelled` (only if it is not
    /// already cancelled) and credit the customer back the full amount.
    /// Returns whether this call won the transition; a `false` means another
    /// caller already compensated and no second refund was issued.
    async fn cancel_and_refund(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
        amount_cents: Cents,
        error: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Compare-and-swap on the order's notified flag. Returns true exactly
    /// once per order, so concurrent status checks cannot double-send the
    /// unlock code.
    async fn mark_notified(
        &self,
        order_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
