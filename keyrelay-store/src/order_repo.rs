use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyrelay_order::models::{Order, OrderItem, OrderStatus};
use keyrelay_order::repository::{OrderRepository, ReserveOutcome, SupplierUpdate};
use keyrelay_shared::money::Cents;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    total_cents: i64,
    currency: String,
    status: String,
    item: Value,
    supplier_order_id: Option<String>,
    supplier_status: Option<String>,
    supplier_response: Option<Value>,
    supplier_error: Option<String>,
    unlock_code: Option<String>,
    notified: bool,
    customer_id: Uuid,
    tenant_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, Box<dyn std::error::Error + Send + Sync>> {
        let item: OrderItem = serde_json::from_value(self.item)?;
        let status = OrderStatus::parse(&self.status)
            .ok_or_else(|| format!("unknown order status: {}", self.status))?;
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            total_cents: self.total_cents,
            currency: self.currency,
            status,
            item,
            supplier_order_id: self.supplier_order_id,
            supplier_status: self.supplier_status,
            supplier_response: self.supplier_response,
            supplier_error: self.supplier_error,
            unlock_code: self.unlock_code,
            notified: self.notified,
            customer_id: self.customer_id,
            tenant_id: self.tenant_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, total_cents, currency, status, item, \
     supplier_order_id, supplier_status, supplier_response, supplier_error, unlock_code, \
     notified, customer_id, tenant_id, created_at, updated_at";

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn reserve_and_create(
        &self,
        order: &Order,
    ) -> Result<ReserveOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        // Conditional decrement: check and debit are a single statement, so
        // two concurrent reservations can never both spend the same funds.
        let debited = sqlx::query(
            "UPDATE customers SET balance_cents = balance_cents - $1 \
             WHERE id = $2 AND tenant_id = $3 AND balance_cents >= $1",
        )
        .bind(order.total_cents)
        .bind(order.customer_id)
        .bind(order.tenant_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if debited == 0 {
            tx.rollback().await?;
            let balance_cents: Cents = sqlx::query_scalar(
                "SELECT balance_cents FROM customers WHERE id = $1 AND tenant_id = $2",
            )
            .bind(order.customer_id)
            .bind(order.tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .unwrap_or(0);
            return Ok(ReserveOutcome::InsufficientFunds { balance_cents });
        }

        sqlx::query(
            "INSERT INTO orders (id, order_number, total_cents, currency, status, item, \
             notified, customer_id, tenant_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8, $9, $10)",
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.total_cents)
        .bind(&order.currency)
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order.item)?)
        .bind(order.customer_id)
        .bind(order.tenant_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReserveOutcome::Created)
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE id = $1 AND tenant_id = $2 AND customer_id = $3"
        ))
        .bind(order_id)
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE tenant_id = $1 AND customer_id = $2 ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn record_supplier_result(
        &self,
        order_id: Uuid,
        update: &SupplierUpdate,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // COALESCE keeps an already-set correlation id: once set, never
        // cleared.
        sqlx::query(
            "UPDATE orders SET status = $2, \
             supplier_order_id = COALESCE($3, supplier_order_id), \
             supplier_status = $4, unlock_code = $5, supplier_response = $6, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(order_id)
        .bind(update.status.as_str())
        .bind(&update.supplier_order_id)
        .bind(&update.supplier_status)
        .bind(&update.unlock_code)
        .bind(&update.raw_response)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cancel_and_refund(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
        amount_cents: Cents,
        error: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-swap on the status gates the refund: only the call
        // that performs the transition credits the customer back.
        let cancelled = sqlx::query(
            "UPDATE orders SET status = 'CANCELLED', supplier_error = $2, updated_at = NOW() \
             WHERE id = $1 AND status <> 'CANCELLED'",
        )
        .bind(order_id)
        .bind(error)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if cancelled == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE customers SET balance_cents = balance_cents + $1 WHERE id = $2")
            .bind(amount_cents)
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn mark_notified(
        &self,
        order_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let updated = sqlx::query(
            "UPDATE orders SET notified = TRUE, updated_at = NOW() \
             WHERE id = $1 AND notified = FALSE",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}
