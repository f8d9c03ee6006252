use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keyrelay_order::orchestrator::OrderError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    /// Business-rule rejection for insufficient funds.
    InsufficientFunds(String),
    /// Order failed upstream; the balance has been refunded.
    SupplierError(String),
    ConfigError(String),
    RateLimited,
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InsufficientFunds(msg) => (StatusCode::CONFLICT, msg),
            AppError::SupplierError(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::ConfigError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::ServiceUnavailable | OrderError::NotFound => {
                AppError::NotFoundError(message)
            }
            OrderError::QuantityOutOfRange { .. }
            | OrderError::InvalidImei
            | OrderError::MissingFile
            | OrderError::NoActiveSupplier => AppError::ValidationError(message),
            OrderError::InsufficientBalance { .. } => AppError::InsufficientFunds(message),
            OrderError::SupplierFailure { .. } | OrderError::SupplierQuery(_) => {
                AppError::SupplierError(message)
            }
            OrderError::Credential(_) => AppError::ConfigError(message),
            OrderError::Store(_) => AppError::InternalServerError(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_errors_map_to_http_categories() {
        let cases = [
            (AppError::from(OrderError::InvalidImei), StatusCode::BAD_REQUEST),
            (AppError::from(OrderError::NotFound), StatusCode::NOT_FOUND),
            (
                AppError::from(OrderError::InsufficientBalance {
                    required_cents: 1000,
                    balance_cents: 100,
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(OrderError::SupplierFailure {
                    order_number: "ORD-1".to_string(),
                    detail: "timeout".to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::from(OrderError::Credential("bad key".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
