use chrono::Utc;
use uuid::Uuid;

/// Generate a human-readable, unique order number.
/// Format: `ORD-{unix millis}-{9 uppercase hex chars}`.
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(9)
        .collect::<String>()
        .to_uppercase();
    format!("ORD-{}-{}", millis, suffix)
}
