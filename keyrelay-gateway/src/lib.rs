pub mod client;
pub mod normalize;

pub use client::{GatewayError, HttpSupplierGateway};
pub use normalize::normalize_response;
