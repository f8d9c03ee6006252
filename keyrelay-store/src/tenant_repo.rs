use async_trait::async_trait;
use keyrelay_core::models::Tenant;
use keyrelay_core::repository::TenantRepository;
use keyrelay_shared::money::Cents;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StoreTenantRepository {
    pool: PgPool,
}

impl StoreTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TenantRow {
    id: Uuid,
    company_name: String,
    sms_enabled: bool,
    sms_sender_id: Option<String>,
    sms_api_key_enc: Option<String>,
    sms_cost_per_segment_cents: i64,
    sms_balance_cents: i64,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            company_name: row.company_name,
            sms_enabled: row.sms_enabled,
            sms_sender_id: row.sms_sender_id,
            sms_api_key_enc: row.sms_api_key_enc,
            sms_cost_per_segment_cents: row.sms_cost_per_segment_cents,
            sms_balance_cents: row.sms_balance_cents,
        }
    }
}

#[async_trait]
impl TenantRepository for StoreTenantRepository {
    async fn get(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<Tenant>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, TenantRow>(
            "SELECT id, company_name, sms_enabled, sms_sender_id, sms_api_key_enc, \
             sms_cost_per_segment_cents, sms_balance_cents \
             FROM tenants WHERE id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Tenant::from))
    }

    async fn try_debit_sms_ledger(
        &self,
        tenant_id: Uuid,
        amount_cents: Cents,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        // Conditional decrement: the balance check and the debit are one
        // statement, so concurrent dispatches can never overdraw the ledger.
        let updated = sqlx::query(
            "UPDATE tenants SET sms_balance_cents = sms_balance_cents - $1 \
             WHERE id = $2 AND sms_balance_cents >= $1",
        )
        .bind(amount_cents)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}
