/// Monetary amounts are carried as integer minor units (cents).
///
/// Balances and prices never touch floating point; the store enforces
/// non-negativity with conditional decrements, so all arithmetic here is
/// plain integer math.
pub type Cents = i64;

/// Render a cent amount as a human-readable dollar string, e.g. `1050` -> `$10.50`.
pub fn format_cents(amount: Cents) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}
