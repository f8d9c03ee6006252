use keyrelay_api::{app, state::AppState};
use keyrelay_core::ratelimit::FixedWindowLimiter;
use keyrelay_core::vault::CredentialVault;
use keyrelay_core::Environment;
use keyrelay_gateway::HttpSupplierGateway;
use keyrelay_notify::dispatcher::NotificationDispatcher;
use keyrelay_notify::transport::HttpSmsTransport;
use keyrelay_order::orchestrator::OrderOrchestrator;
use keyrelay_store::{
    DbClient, StoreCatalogRepository, StoreCustomerRepository, StoreOrderRepository,
    StoreSupplierRepository, StoreTenantRepository,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyrelay_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = keyrelay_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting KeyRelay API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to run migrations");

    let environment = Environment::new(
        config.security.production,
        config.security.master_key.clone(),
    )
    .expect("Invalid security configuration");
    let vault = Arc::new(CredentialVault::new(&environment));

    let customers = Arc::new(StoreCustomerRepository::new(db.pool.clone()));
    let tenants = Arc::new(StoreTenantRepository::new(db.pool.clone()));
    let catalog = Arc::new(StoreCatalogRepository::new(db.pool.clone()));
    let suppliers = Arc::new(StoreSupplierRepository::new(db.pool.clone()));
    let orders = Arc::new(StoreOrderRepository::new(db.pool.clone()));

    let gateway = Arc::new(
        HttpSupplierGateway::new(Duration::from_secs(config.supplier.request_timeout_seconds))
            .expect("Failed to build supplier gateway"),
    );
    let transport = Arc::new(
        HttpSmsTransport::new(
            config.sms.transport_url.clone(),
            Duration::from_secs(config.sms.request_timeout_seconds),
        )
        .expect("Failed to build SMS transport"),
    );

    let dispatcher = Arc::new(NotificationDispatcher::new(
        customers.clone(),
        tenants.clone(),
        transport,
        vault.clone(),
        config.sms.default_cost_per_segment_cents,
    ));
    let orchestrator = Arc::new(OrderOrchestrator::new(
        catalog.clone(),
        suppliers.clone(),
        orders,
        tenants.clone(),
        gateway.clone(),
        dispatcher.clone(),
        vault.clone(),
    ));

    let rate_limiter = Arc::new(FixedWindowLimiter::new(
        config.server.rate_limit_per_minute,
        Duration::from_secs(60),
    ));

    let app_state = AppState {
        orchestrator,
        dispatcher,
        catalog,
        suppliers,
        gateway,
        vault,
        rate_limiter,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
