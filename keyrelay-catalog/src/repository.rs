use crate::service::ManagedService;
use crate::supplier::Supplier;
use crate::sync::{NewListing, PriceUpdate};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository trait for catalog listings.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Fetch one listing scoped to a tenant, regardless of its enabled flag.
    /// The orchestrator distinguishes "missing" from "disabled" itself.
    async fn get(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<ManagedService>, Box<dyn std::error::Error + Send + Sync>>;

    /// All listings a customer may order from.
    async fn list_enabled(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<ManagedService>, Box<dyn std::error::Error + Send + Sync>>;

    /// All listings for one supplier connection, enabled or not (sync input).
    async fn list_for_supplier(
        &self,
        tenant_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Vec<ManagedService>, Box<dyn std::error::Error + Send + Sync>>;

    /// Apply a sync plan: insert new listings (disabled by default) and
    /// refresh supplier costs on known ones.
    async fn apply_sync(
        &self,
        tenant_id: Uuid,
        create: &[NewListing],
        update_price: &[PriceUpdate],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for supplier connections.
#[async_trait]
pub trait SupplierRepository: Send + Sync {
    async fn get(
        &self,
        tenant_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Option<Supplier>, Box<dyn std::error::Error + Send + Sync>>;

    /// Active suppliers for a tenant; selection happens in
    /// [`crate::selection::choose_supplier`].
    async fn list_active(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<Supplier>, Box<dyn std::error::Error + Send + Sync>>;
}
