use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyrelay_core::models::Customer;
use keyrelay_core::repository::CustomerRepository;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StoreCustomerRepository {
    pool: PgPool,
}

impl StoreCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    tenant_id: Uuid,
    email: Option<String>,
    phone: Option<String>,
    sms_enabled: bool,
    balance_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            tenant_id: row.tenant_id,
            email: row.email,
            phone: row.phone,
            sms_enabled: row.sms_enabled,
            balance_cents: row.balance_cents,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CustomerRepository for StoreCustomerRepository {
    async fn get(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, tenant_id, email, phone, sms_enabled, balance_cents, created_at \
             FROM customers WHERE id = $1 AND tenant_id = $2",
        )
        .bind(customer_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }
}
