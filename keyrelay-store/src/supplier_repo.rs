use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyrelay_catalog::repository::SupplierRepository;
use keyrelay_catalog::supplier::Supplier;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StoreSupplierRepository {
    pool: PgPool,
}

impl StoreSupplierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SupplierRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    api_url: String,
    account: String,
    api_key_enc: String,
    active: bool,
    priority: i32,
    created_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            api_url: row.api_url,
            account: row.account,
            api_key_enc: row.api_key_enc,
            active: row.active,
            priority: row.priority,
            created_at: row.created_at,
        }
    }
}

const SUPPLIER_COLUMNS: &str =
    "id, tenant_id, name, api_url, account, api_key_enc, active, priority, created_at";

#[async_trait]
impl SupplierRepository for StoreSupplierRepository {
    async fn get(
        &self,
        tenant_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Option<Supplier>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(supplier_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Supplier::from))
    }

    async fn list_active(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<Supplier>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers \
             WHERE tenant_id = $1 AND active ORDER BY priority DESC, id ASC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Supplier::from).collect())
    }
}
