pub mod dispatcher;
pub mod encoding;
pub mod format;
pub mod transport;

pub use dispatcher::{DispatchOutcome, NotificationDispatcher, SkipReason};
pub use encoding::{calculate_sms_cost, SmsCostBreakdown, SmsEncoding};
pub use transport::HttpSmsTransport;
