use crate::service::{ManagedService, ServiceKind};
use keyrelay_core::supplier::SupplierService;
use keyrelay_shared::money::Cents;
use serde::Serialize;
use uuid::Uuid;

/// Default markup applied when a sync creates a brand-new listing:
/// resale = supplier price + 30%, rounded up to the next cent.
const DEFAULT_MARKUP_PERCENT: Cents = 30;

/// A new listing to create from the supplier's catalog.
#[derive(Debug, Clone, Serialize)]
pub struct NewListing {
    pub supplier_id: Uuid,
    pub supplier_service_id: String,
    pub name: String,
    pub kind: ServiceKind,
    pub supplier_price_cents: Cents,
    pub resale_price_cents: Cents,
}

/// A supplier-side price change for an existing listing.
#[derive(Debug, Clone, Serialize)]
pub struct PriceUpdate {
    pub service_id: Uuid,
    pub supplier_price_cents: Cents,
}

/// Result of diffing the tenant catalog against the supplier service list.
#[derive(Debug, Default, Serialize)]
pub struct SyncPlan {
    pub create: Vec<NewListing>,
    pub update_price: Vec<PriceUpdate>,
    /// Supplier services without a usable price, skipped entirely.
    pub skipped: Vec<String>,
}

/// Diff the supplier's service list against the tenant's existing listings
/// for that supplier.
///
/// New upstream services become disabled-by-default listings with a default
/// markup; known services only get their supplier cost refreshed. Resale
/// price, enabled flag and quantity bounds are admin-owned and never touched.
pub fn plan_sync(
    supplier_id: Uuid,
    existing: &[ManagedService],
    fetched: &[SupplierService],
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for remote in fetched {
        let Some(price) = remote.price_cents.filter(|p| *p >= 0) else {
            plan.skipped.push(remote.service_id.clone());
            continue;
        };

        match existing
            .iter()
            .find(|s| s.supplier_id == supplier_id && s.supplier_service_id == remote.service_id)
        {
            Some(known) => {
                if known.supplier_price_cents != price {
                    plan.update_price.push(PriceUpdate {
                        service_id: known.id,
                        supplier_price_cents: price,
                    });
                }
            }
            None => {
                plan.create.push(NewListing {
                    supplier_id,
                    supplier_service_id: remote.service_id.clone(),
                    name: remote.name.clone(),
                    kind: ServiceKind::Imei,
                    supplier_price_cents: price,
                    resale_price_cents: with_default_markup(price),
                });
            }
        }
    }

    plan
}

fn with_default_markup(supplier_price_cents: Cents) -> Cents {
    let markup = supplier_price_cents * DEFAULT_MARKUP_PERCENT;
    supplier_price_cents + (markup + 99) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(supplier_id: Uuid, service_id: &str, cost: Cents) -> ManagedService {
        let now = Utc::now();
        ManagedService {
            id: Uuid::new_v4(),
            tenant_id: Uuid::from_u128(1),
            supplier_id,
            supplier_service_id: service_id.to_string(),
            name: "Existing".to_string(),
            kind: ServiceKind::Imei,
            supplier_price_cents: cost,
            resale_price_cents: cost * 2,
            enabled: true,
            min_quantity: 1,
            max_quantity: 10,
            created_at: now,
            updated_at: now,
        }
    }

    fn remote(service_id: &str, price: Option<Cents>) -> SupplierService {
        SupplierService {
            service_id: service_id.to_string(),
            name: format!("Remote {}", service_id),
            price_cents: price,
        }
    }

    #[test]
    fn test_new_services_get_default_markup() {
        let supplier_id = Uuid::from_u128(9);
        let plan = plan_sync(supplier_id, &[], &[remote("101", Some(1000))]);

        assert_eq!(plan.create.len(), 1);
        assert!(plan.update_price.is_empty());
        let created = &plan.create[0];
        assert_eq!(created.supplier_price_cents, 1000);
        assert_eq!(created.resale_price_cents, 1300);
    }

    #[test]
    fn test_known_services_only_refresh_cost() {
        let supplier_id = Uuid::from_u128(9);
        let existing = vec![listing(supplier_id, "101", 1000)];
        let plan = plan_sync(supplier_id, &existing, &[remote("101", Some(1200))]);

        assert!(plan.create.is_empty());
        assert_eq!(plan.update_price.len(), 1);
        assert_eq!(plan.update_price[0].supplier_price_cents, 1200);
    }

    #[test]
    fn test_unchanged_price_is_a_noop() {
        let supplier_id = Uuid::from_u128(9);
        let existing = vec![listing(supplier_id, "101", 1000)];
        let plan = plan_sync(supplier_id, &existing, &[remote("101", Some(1000))]);

        assert!(plan.create.is_empty());
        assert!(plan.update_price.is_empty());
    }

    #[test]
    fn test_unpriced_services_are_skipped() {
        let plan = plan_sync(Uuid::from_u128(9), &[], &[remote("101", None)]);
        assert!(plan.create.is_empty());
        assert_eq!(plan.skipped, vec!["101".to_string()]);
    }

    #[test]
    fn test_markup_rounds_up() {
        // 1 cent * 30% = 0.3 cents, rounds up to 1 cent of markup.
        assert_eq!(with_default_markup(1), 2);
        assert_eq!(with_default_markup(10), 13);
    }
}
