use crate::models::{Customer, Tenant};
use async_trait::async_trait;
use keyrelay_shared::money::Cents;
use uuid::Uuid;

/// Repository trait for customer data access.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn get(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for tenant data access, including the SMS ledger.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn get(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<Tenant>, Box<dyn std::error::Error + Send + Sync>>;

    /// Atomically debit the tenant's SMS ledger if the balance covers
    /// `amount_cents`. Returns false when funds are short; the ledger is
    /// never driven negative.
    async fn try_debit_sms_ledger(
        &self,
        tenant_id: Uuid,
        amount_cents: Cents,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
