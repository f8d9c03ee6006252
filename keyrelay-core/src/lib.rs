pub mod env;
pub mod models;
pub mod ratelimit;
pub mod repository;
pub mod sms;
pub mod supplier;
pub mod vault;

pub use env::Environment;
pub use ratelimit::{FixedWindowLimiter, RateLimiter};
pub use vault::CredentialVault;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
