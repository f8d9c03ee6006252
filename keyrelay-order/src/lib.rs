pub mod models;
pub mod number;
pub mod orchestrator;
pub mod repository;

pub use models::{Order, OrderInput, OrderItem, OrderStatus};
pub use orchestrator::{OrderError, OrderOrchestrator, PlacedOrder, StatusReport};
pub use repository::{OrderRepository, ReserveOutcome, SupplierUpdate};
