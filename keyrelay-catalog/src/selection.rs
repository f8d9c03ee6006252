use crate::supplier::Supplier;

/// Pick the supplier an order should be routed to.
///
/// Filters inactive records, then prefers the highest priority value,
/// breaking ties deterministically by ascending id. Returns `None` when the
/// tenant has no active supplier, which rejects the order before any
/// persistence happens.
pub fn choose_supplier(suppliers: &[Supplier]) -> Option<&Supplier> {
    suppliers
        .iter()
        .filter(|s| s.active)
        .min_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)))
}
