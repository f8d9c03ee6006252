pub mod money;
pub mod pii;

pub use money::format_cents;
pub use pii::Masked;
