use axum::{
    extract::State,
    http::Method,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod error;
pub mod identity;
pub mod orders;
pub mod services;
pub mod sms;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/v1/orders", post(orders::place_order).get(orders::list_orders))
        .route("/v1/orders/{id}/status", get(orders::order_status))
        .route("/v1/services", get(services::list_services))
        .route("/v1/sms/estimate", post(sms::estimate_cost))
        .route("/v1/admin/suppliers/{id}/sync", post(admin::sync_services))
        .route("/v1/admin/suppliers/{id}/balance", get(admin::supplier_balance))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Per-tenant request limiter over the injectable limiter seam. Requests
/// without a tenant header share one bucket keyed by "anonymous".
async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, error::AppError> {
    let tenant = req
        .headers()
        .get("x-tenant-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous");
    let key = format!("ratelimit:{}", tenant);

    if !state.rate_limiter.allow(&key) {
        return Err(error::AppError::RateLimited);
    }
    Ok(next.run(req).await)
}
