use keyrelay_catalog::repository::{CatalogRepository, SupplierRepository};
use keyrelay_core::ratelimit::RateLimiter;
use keyrelay_core::supplier::SupplierGateway;
use keyrelay_core::vault::CredentialVault;
use keyrelay_notify::dispatcher::NotificationDispatcher;
use keyrelay_order::orchestrator::OrderOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<OrderOrchestrator>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub suppliers: Arc<dyn SupplierRepository>,
    pub gateway: Arc<dyn SupplierGateway>,
    pub vault: Arc<CredentialVault>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}
