use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyrelay_catalog::repository::CatalogRepository;
use keyrelay_catalog::service::{ManagedService, ServiceKind};
use keyrelay_catalog::sync::{NewListing, PriceUpdate};
use sqlx::PgPool;
use uuid::Uuid;

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    tenant_id: Uuid,
    supplier_id: Uuid,
    supplier_service_id: String,
    name: String,
    kind: String,
    supplier_price_cents: i64,
    resale_price_cents: i64,
    enabled: bool,
    min_quantity: i32,
    max_quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_kind(raw: &str) -> ServiceKind {
    match raw {
        "FILE" => ServiceKind::File,
        "GENERIC" => ServiceKind::Generic,
        _ => ServiceKind::Imei,
    }
}

fn kind_str(kind: ServiceKind) -> &'static str {
    match kind {
        ServiceKind::Imei => "IMEI",
        ServiceKind::File => "FILE",
        ServiceKind::Generic => "GENERIC",
    }
}

impl From<ServiceRow> for ManagedService {
    fn from(row: ServiceRow) -> Self {
        ManagedService {
            id: row.id,
            tenant_id: row.tenant_id,
            supplier_id: row.supplier_id,
            supplier_service_id: row.supplier_service_id,
            name: row.name,
            kind: parse_kind(&row.kind),
            supplier_price_cents: row.supplier_price_cents,
            resale_price_cents: row.resale_price_cents,
            enabled: row.enabled,
            min_quantity: row.min_quantity,
            max_quantity: row.max_quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SERVICE_COLUMNS: &str = "id, tenant_id, supplier_id, supplier_service_id, name, kind, \
     supplier_price_cents, resale_price_cents, enabled, min_quantity, max_quantity, \
     created_at, updated_at";

#[async_trait]
impl CatalogRepository for StoreCatalogRepository {
    async fn get(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<ManagedService>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM managed_services WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(service_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ManagedService::from))
    }

    async fn list_enabled(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<ManagedService>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM managed_services \
             WHERE tenant_id = $1 AND enabled ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ManagedService::from).collect())
    }

    async fn list_for_supplier(
        &self,
        tenant_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Vec<ManagedService>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM managed_services \
             WHERE tenant_id = $1 AND supplier_id = $2"
        ))
        .bind(tenant_id)
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ManagedService::from).collect())
    }

    async fn apply_sync(
        &self,
        tenant_id: Uuid,
        create: &[NewListing],
        update_price: &[PriceUpdate],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        for listing in create {
            // New listings land disabled; an admin reviews pricing before
            // customers can order them.
            sqlx::query(
                "INSERT INTO managed_services \
                 (id, tenant_id, supplier_id, supplier_service_id, name, kind, \
                  supplier_price_cents, resale_price_cents, enabled, min_quantity, max_quantity) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, 1, 1) \
                 ON CONFLICT (tenant_id, supplier_id, supplier_service_id) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(listing.supplier_id)
            .bind(&listing.supplier_service_id)
            .bind(&listing.name)
            .bind(kind_str(listing.kind))
            .bind(listing.supplier_price_cents)
            .bind(listing.resale_price_cents)
            .execute(&mut *tx)
            .await?;
        }

        for update in update_price {
            sqlx::query(
                "UPDATE managed_services SET supplier_price_cents = $1, updated_at = NOW() \
                 WHERE id = $2 AND tenant_id = $3",
            )
            .bind(update.supplier_price_cents)
            .bind(update.service_id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [ServiceKind::Imei, ServiceKind::File, ServiceKind::Generic] {
            assert_eq!(parse_kind(kind_str(kind)), kind);
        }
        // Unknown kinds default to the most common case.
        assert_eq!(parse_kind("SOMETHING_NEW"), ServiceKind::Imei);
    }
}
