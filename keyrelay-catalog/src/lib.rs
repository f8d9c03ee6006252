pub mod repository;
pub mod selection;
pub mod service;
pub mod supplier;
pub mod sync;

pub use selection::choose_supplier;
pub use service::{ManagedService, ServiceKind};
pub use supplier::Supplier;
pub use sync::{plan_sync, SyncPlan};
