use keyrelay_core::supplier::{NormalizedSupplierResult, SupplierOrderState};
use serde_json::Value;

// The upstream API is loosely specified and different deployments report the
// same logical field under different names. Each logical field probes an
// ordered list of known synonyms; the first hit wins.
const ORDER_ID_KEYS: &[&str] = &["orderId", "orderid", "order_id", "referenceid", "id"];
const ORDER_STATUS_KEYS: &[&str] = &["orderStatus", "orderstatus", "order_status"];
const CODE_KEYS: &[&str] = &["code", "unlockCode", "unlockcode", "result"];
const ERROR_KEYS: &[&str] = &["errorMessage", "errormessage", "error", "message"];
const ERROR_CODE_KEYS: &[&str] = &["errorCode", "errorcode", "error_code"];

/// Collapse the supplier's loosely-typed JSON into the uniform result shape.
///
/// Never fails: missing or unexpectedly-typed fields simply come back as
/// `None`. The raw value is kept verbatim for the order's audit trail.
pub fn normalize_response(raw: Value) -> NormalizedSupplierResult {
    let envelope_status = probe_string(&raw, &["status"]);
    let is_success = envelope_status
        .as_deref()
        .map(|s| s.eq_ignore_ascii_case("SUCCESS"))
        .unwrap_or(false);

    // Per-order status if reported, otherwise fall back to the envelope.
    let reported_status = probe_string(&raw, ORDER_STATUS_KEYS).or(envelope_status);
    let state = parse_state(reported_status.as_deref());

    NormalizedSupplierResult {
        is_success,
        supplier_order_id: probe_string(&raw, ORDER_ID_KEYS),
        reported_status,
        state,
        result_code: probe_string(&raw, CODE_KEYS),
        error_message: probe_string(&raw, ERROR_KEYS),
        error_code: probe_string(&raw, ERROR_CODE_KEYS),
        raw_response: raw,
    }
}

fn parse_state(status: Option<&str>) -> SupplierOrderState {
    match status {
        Some(s) if s.eq_ignore_ascii_case("completed") => SupplierOrderState::Completed,
        Some(s) if s.eq_ignore_ascii_case("rejected") => SupplierOrderState::Rejected,
        _ => SupplierOrderState::Pending,
    }
}

/// First non-empty string found under the given keys. Numbers are accepted
/// and stringified, some deployments report ids numerically.
pub(crate) fn probe_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// First array found under the given keys.
pub(crate) fn probe_array<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|key| value.get(key)?.as_array())
}

/// Parse a loosely-typed decimal price ("2.5", 2.5 or 2) into cents.
pub(crate) fn probe_price_cents(value: &Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        let parsed = match value.get(key) {
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        };
        if let Some(price) = parsed {
            if price.is_finite() && price >= 0.0 {
                return Some((price * 100.0).round() as i64);
            }
        }
    }
    None
}
