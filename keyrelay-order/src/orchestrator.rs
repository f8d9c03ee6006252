use crate::models::{Order, OrderInput, OrderItem, OrderStatus};
use crate::number::generate_order_number;
use crate::repository::{OrderRepository, ReserveOutcome, SupplierUpdate};
use keyrelay_catalog::repository::{CatalogRepository, SupplierRepository};
use keyrelay_catalog::selection::choose_supplier;
use keyrelay_catalog::service::{ManagedService, ServiceKind};
use keyrelay_catalog::supplier::Supplier;
use keyrelay_core::repository::TenantRepository;
use keyrelay_core::supplier::{
    FileUpload, OrderSubmission, SupplierCredentials, SupplierGateway, SupplierOrderState,
};
use keyrelay_core::vault::CredentialVault;
use keyrelay_notify::dispatcher::{DispatchOutcome, NotificationDispatcher};
use keyrelay_notify::format::format_unlock_code_message;
use keyrelay_shared::money::{format_cents, Cents};
use keyrelay_shared::pii::Masked;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

const CURRENCY: &str = "USD";
const IMEI_LENGTH: usize = 15;
const DEFAULT_COMPANY_NAME: &str = "KeyRelay";

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("service not found or not available")]
    ServiceUnavailable,

    #[error("quantity must be between {min} and {max}")]
    QuantityOutOfRange { min: i32, max: i32 },

    #[error("a valid 15-digit IMEI is required for this service")]
    InvalidImei,

    #[error("a file upload is required for this service")]
    MissingFile,

    #[error("no active supplier configured, please contact support")]
    NoActiveSupplier,

    #[error("insufficient balance: {} required, {} available", format_cents(*required_cents), format_cents(*balance_cents))]
    InsufficientBalance {
        required_cents: Cents,
        balance_cents: Cents,
    },

    #[error("failed to process order with supplier, your balance has been refunded")]
    SupplierFailure {
        order_number: String,
        detail: String,
    },

    #[error("failed to check status with supplier: {0}")]
    SupplierQuery(String),

    #[error("supplier credentials unavailable: {0}")]
    Credential(String),

    #[error("order not found")]
    NotFound,

    #[error("storage error: {0}")]
    Store(String),
}

fn store_err(err: Box<dyn std::error::Error + Send + Sync>) -> OrderError {
    OrderError::Store(err.to_string())
}

/// A validated purchase request, before pricing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderRequest {
    pub service_id: Uuid,
    pub quantity: i32,
    #[serde(default = "default_input")]
    pub input: OrderInput,
}

fn default_input() -> OrderInput {
    OrderInput::Generic
}

/// Result of a successful placement. The order may still be pending
/// fulfillment at the supplier.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    /// Outcome of the best-effort unlock-code notification, when one was
    /// attempted.
    pub notification: Option<DispatchOutcome>,
}

/// Result of a status check against the supplier.
#[derive(Debug)]
pub struct StatusReport {
    pub order_number: String,
    pub status: OrderStatus,
    pub supplier_status: Option<String>,
    pub unlock_code: Option<String>,
    /// Whether this call issued the compensating refund.
    pub refunded: bool,
    /// Whether the order has been submitted to a supplier at all.
    pub submitted: bool,
    pub notification: Option<DispatchOutcome>,
}

impl StatusReport {
    fn from_order(order: &Order, refunded: bool, notification: Option<DispatchOutcome>) -> Self {
        Self {
            order_number: order.order_number.clone(),
            status: order.status,
            supplier_status: order.supplier_status.clone(),
            unlock_code: order.unlock_code.clone(),
            refunded,
            submitted: order.supplier_order_id.is_some(),
            notification,
        }
    }
}

/// The order fulfillment state machine.
///
/// Validates and prices a purchase against the tenant catalog, reserves
/// funds atomically, submits upstream, reconciles the outcome and
/// compensates with a refund on failure. Funds move only through the
/// repository's transactional operations; this type never does
/// read-modify-write on a balance.
pub struct OrderOrchestrator {
    catalog: Arc<dyn CatalogRepository>,
    suppliers: Arc<dyn SupplierRepository>,
    orders: Arc<dyn OrderRepository>,
    tenants: Arc<dyn TenantRepository>,
    gateway: Arc<dyn SupplierGateway>,
    dispatcher: Arc<NotificationDispatcher>,
    vault: Arc<CredentialVault>,
}

impl OrderOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        suppliers: Arc<dyn SupplierRepository>,
        orders: Arc<dyn OrderRepository>,
        tenants: Arc<dyn TenantRepository>,
        gateway: Arc<dyn SupplierGateway>,
        dispatcher: Arc<NotificationDispatcher>,
        vault: Arc<CredentialVault>,
    ) -> Self {
        Self {
            catalog,
            suppliers,
            orders,
            tenants,
            gateway,
            dispatcher,
            vault,
        }
    }

    /// Place an order for a tenant-scoped service.
    ///
    /// Validation failures and insufficient funds reject synchronously with
    /// no side effects. Once funds are reserved, any supplier failure rolls
    /// the reservation back through the compensating refund.
    pub async fn place_order(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        request: NewOrderRequest,
    ) -> Result<PlacedOrder, OrderError> {
        let service = self
            .catalog
            .get(tenant_id, request.service_id)
            .await
            .map_err(store_err)?
            .filter(|s| s.enabled)
            .ok_or(OrderError::ServiceUnavailable)?;

        if !service.quantity_in_range(request.quantity) {
            return Err(OrderError::QuantityOutOfRange {
                min: service.min_quantity,
                max: service.max_quantity,
            });
        }
        validate_input(service.kind, &request.input)?;

        let supplier = self.active_supplier(tenant_id).await?;
        // Decrypt before touching funds so a configuration problem cannot
        // leave a debit behind.
        let credentials = self.credentials(&supplier)?;

        let item = snapshot_item(&service, &request);
        let order = Order::new(
            tenant_id,
            customer_id,
            generate_order_number(),
            item,
            CURRENCY,
        );

        match self
            .orders
            .reserve_and_create(&order)
            .await
            .map_err(store_err)?
        {
            ReserveOutcome::Created => {}
            ReserveOutcome::InsufficientFunds { balance_cents } => {
                return Err(OrderError::InsufficientBalance {
                    required_cents: order.total_cents,
                    balance_cents,
                });
            }
        }

        tracing::info!(
            order = %order.order_number,
            tenant_id = %tenant_id,
            total = %format_cents(order.total_cents),
            "funds reserved, submitting to supplier"
        );

        let submission = build_submission(&order);
        let result = match self.gateway.place_order(&credentials, &submission).await {
            Ok(result) => result,
            Err(err) => return Err(self.fail_and_refund(&order, err.to_string()).await),
        };

        if !result.is_success {
            let detail = result
                .error_message
                .unwrap_or_else(|| "supplier rejected the order".to_string());
            return Err(self.fail_and_refund(&order, detail).await);
        }

        let status = if result.is_completed_with_code() {
            OrderStatus::Completed
        } else {
            OrderStatus::Pending
        };
        let update = SupplierUpdate {
            status,
            supplier_order_id: result.supplier_order_id.clone(),
            supplier_status: result.reported_status.clone(),
            unlock_code: result.result_code.clone(),
            raw_response: result.raw_response.clone(),
        };
        self.orders
            .record_supplier_result(order.id, &update)
            .await
            .map_err(store_err)?;

        let mut order = order;
        order.status = status;
        order.supplier_order_id = update.supplier_order_id.clone();
        order.supplier_status = update.supplier_status.clone();
        order.unlock_code = update.unlock_code.clone();
        order.supplier_response = Some(update.raw_response.clone());

        let notification = if order.status == OrderStatus::Completed {
            self.send_unlock_notification(&order).await
        } else {
            None
        };

        Ok(PlacedOrder {
            order,
            notification,
        })
    }

    /// Re-query the supplier for an already-submitted order, persist the
    /// re-derived state, and deliver the unlock code exactly once when the
    /// order transitions to completed.
    pub async fn check_order_status(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> Result<StatusReport, OrderError> {
        let order = self
            .orders
            .get(tenant_id, customer_id, order_id)
            .await
            .map_err(store_err)?
            .ok_or(OrderError::NotFound)?;

        let Some(supplier_order_id) = order.supplier_order_id.clone() else {
            return Ok(StatusReport::from_order(&order, false, None));
        };

        let supplier = self.active_supplier(tenant_id).await?;
        let credentials = self.credentials(&supplier)?;

        let result = self
            .gateway
            .check_status(&credentials, &supplier_order_id)
            .await
            .map_err(|err| OrderError::SupplierQuery(err.to_string()))?;

        let was_completed = order.status == OrderStatus::Completed;

        // A failed query envelope leaves the stored state untouched.
        let next_status = if result.is_success {
            match result.state {
                SupplierOrderState::Completed => OrderStatus::Completed,
                SupplierOrderState::Rejected => OrderStatus::Cancelled,
                SupplierOrderState::Pending => OrderStatus::Pending,
            }
        } else {
            order.status
        };

        // A late rejection still owes the customer their money back. The
        // refund transaction compare-and-swaps on the status so repeated
        // polls can only compensate once.
        let mut refunded = false;
        if next_status == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled {
            let reason = result
                .error_message
                .clone()
                .unwrap_or_else(|| "order rejected by supplier".to_string());
            refunded = self
                .orders
                .cancel_and_refund(order.id, order.customer_id, order.total_cents, &reason)
                .await
                .map_err(store_err)?;
            if refunded {
                tracing::warn!(
                    order = %order.order_number,
                    "supplier rejected the order after submission, balance refunded"
                );
            }
        }

        let update = SupplierUpdate {
            status: next_status,
            supplier_order_id: Some(supplier_order_id),
            supplier_status: result.reported_status.clone(),
            unlock_code: result.result_code.clone().or_else(|| order.unlock_code.clone()),
            raw_response: result.raw_response.clone(),
        };
        self.orders
            .record_supplier_result(order.id, &update)
            .await
            .map_err(store_err)?;

        let mut order = order;
        order.status = next_status;
        order.supplier_status = update.supplier_status.clone();
        order.unlock_code = update.unlock_code.clone();

        let notification = if !was_completed
            && order.status == OrderStatus::Completed
            && order.unlock_code.is_some()
        {
            self.send_unlock_notification(&order).await
        } else {
            None
        };

        Ok(StatusReport::from_order(&order, refunded, notification))
    }

    /// Orders visible to one customer, newest first per the repository.
    pub async fn list_orders(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, OrderError> {
        self.orders
            .list(tenant_id, customer_id)
            .await
            .map_err(store_err)
    }

    async fn active_supplier(&self, tenant_id: Uuid) -> Result<Supplier, OrderError> {
        let suppliers = self
            .suppliers
            .list_active(tenant_id)
            .await
            .map_err(store_err)?;
        choose_supplier(&suppliers)
            .cloned()
            .ok_or(OrderError::NoActiveSupplier)
    }

    fn credentials(&self, supplier: &Supplier) -> Result<SupplierCredentials, OrderError> {
        let api_key = self
            .vault
            .decrypt(&supplier.api_key_enc)
            .map_err(|err| OrderError::Credential(err.to_string()))?;
        Ok(SupplierCredentials {
            api_url: supplier.api_url.clone(),
            account: supplier.account.clone(),
            api_key: Masked(api_key),
        })
    }

    /// Compensation path: mark the order cancelled and credit the customer
    /// back in one transaction, then surface the refunded failure.
    async fn fail_and_refund(&self, order: &Order, detail: String) -> OrderError {
        match self
            .orders
            .cancel_and_refund(order.id, order.customer_id, order.total_cents, &detail)
            .await
        {
            Ok(_) => {
                tracing::warn!(
                    order = %order.order_number,
                    "supplier call failed, balance refunded: {detail}"
                );
                OrderError::SupplierFailure {
                    order_number: order.order_number.clone(),
                    detail,
                }
            }
            Err(err) => {
                // The debit is committed but the compensation did not go
                // through; this order needs operator attention.
                tracing::error!(
                    order = %order.order_number,
                    "compensating refund FAILED after supplier error ({detail}): {err}"
                );
                OrderError::Store(format!("order failed and refund could not be recorded: {err}"))
            }
        }
    }

    /// Best-effort unlock-code delivery. The compare-and-swap on the
    /// notified flag guarantees at most one dispatch per order, no matter
    /// how many concurrent status checks observe the completion.
    async fn send_unlock_notification(&self, order: &Order) -> Option<DispatchOutcome> {
        let code = order.unlock_code.as_deref()?;

        match self.orders.mark_notified(order.id).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                tracing::warn!(order = %order.order_number, "notified flag update failed: {err}");
                return None;
            }
        }

        let company = match self.tenants.get(order.tenant_id).await {
            Ok(Some(tenant)) => tenant.company_name,
            _ => DEFAULT_COMPANY_NAME.to_string(),
        };
        let message = format_unlock_code_message(
            &order.order_number,
            &order.item.service_name,
            code,
            &company,
        );

        let outcome = self
            .dispatcher
            .dispatch(order.tenant_id, order.customer_id, &message)
            .await;

        match &outcome {
            DispatchOutcome::Sent { .. } => {
                tracing::info!(order = %order.order_number, "unlock code SMS dispatched");
            }
            DispatchOutcome::Skipped { reason } => {
                tracing::info!(order = %order.order_number, "unlock code SMS skipped: {reason}");
            }
            DispatchOutcome::Failed { error, .. } => {
                tracing::warn!(order = %order.order_number, "unlock code SMS failed: {error}");
            }
        }
        Some(outcome)
    }
}

fn validate_input(kind: ServiceKind, input: &OrderInput) -> Result<(), OrderError> {
    match kind {
        ServiceKind::Imei => match input {
            OrderInput::Imei { imei } if is_valid_imei(imei) => Ok(()),
            _ => Err(OrderError::InvalidImei),
        },
        ServiceKind::File => match input {
            OrderInput::File { file_data, .. } if !file_data.is_empty() => Ok(()),
            _ => Err(OrderError::MissingFile),
        },
        ServiceKind::Generic => Ok(()),
    }
}

fn is_valid_imei(imei: &str) -> bool {
    imei.len() == IMEI_LENGTH && imei.chars().all(|c| c.is_ascii_digit())
}

fn snapshot_item(service: &ManagedService, request: &NewOrderRequest) -> OrderItem {
    OrderItem {
        service_id: service.id,
        service_name: service.name.clone(),
        service_kind: service.kind,
        supplier_service_id: service.supplier_service_id.clone(),
        quantity: request.quantity,
        unit_price_cents: service.resale_price_cents,
        supplier_price_cents: service.supplier_price_cents,
        input: request.input.clone(),
    }
}

fn build_submission(order: &Order) -> OrderSubmission {
    let (imei, file) = match &order.item.input {
        OrderInput::Imei { imei } => (Some(imei.clone()), None),
        OrderInput::File {
            file_name,
            file_data,
        } => (
            None,
            Some(FileUpload {
                name: file_name.clone(),
                data: file_data.clone(),
            }),
        ),
        OrderInput::Generic => (None, None),
    };
    OrderSubmission {
        supplier_service_id: order.item.supplier_service_id.clone(),
        imei,
        file,
        reference: order.order_number.clone(),
    }
}
