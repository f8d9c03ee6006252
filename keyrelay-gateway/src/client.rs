use crate::normalize::{normalize_response, probe_array, probe_price_cents, probe_string};
use async_trait::async_trait;
use keyrelay_core::supplier::{
    NormalizedSupplierResult, OrderSubmission, SupplierAccountBalance, SupplierCredentials,
    SupplierGateway, SupplierService,
};
use serde_json::Value;
use std::time::Duration;

const ACTION_PLACE_ORDER: &str = "place-order";
const ACTION_CHECK_ORDER: &str = "check-order";
const ACTION_BALANCE: &str = "balance";
const ACTION_SERVICE_LIST: &str = "service-list";

const BALANCE_KEYS: &[&str] = &["balance", "credit", "credits"];
const SERVICE_LIST_KEYS: &[&str] = &["services", "list", "LIST", "data"];
const SERVICE_ID_KEYS: &[&str] = &["id", "serviceId", "serviceid", "service_id"];
const SERVICE_NAME_KEYS: &[&str] = &["name", "service", "servicename", "title"];
const SERVICE_PRICE_KEYS: &[&str] = &["credit", "price", "cost"];

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("supplier transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("supplier returned HTTP {status} with no structured body")]
    Http { status: u16 },

    #[error("supplier returned an unparseable body: {0}")]
    MalformedBody(String),
}

/// HTTP implementation of the supplier gateway.
///
/// Every operation is a single form-encoded POST to the supplier's endpoint
/// carrying `{account, secret, action, ...params}`. No built-in retry; the
/// caller decides when to re-poll.
pub struct HttpSupplierGateway {
    http: reqwest::Client,
}

impl HttpSupplierGateway {
    pub fn new(request_timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { http })
    }

    async fn call(
        &self,
        credentials: &SupplierCredentials,
        action: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Value, GatewayError> {
        let mut form: Vec<(&str, String)> = vec![
            ("account", credentials.account.clone()),
            ("secret", credentials.api_key.0.clone()),
            ("action", action.to_string()),
        ];
        form.extend(params);

        tracing::debug!(url = %credentials.api_url, action, "calling supplier");

        let response = self
            .http
            .post(&credentials.api_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // A structured error body (any parseable JSON) is normalized rather
        // than raised, even on a non-2xx status. Only an unparseable reply
        // counts as transport failure.
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(GatewayError::Http {
                status: status.as_u16(),
            }),
            Err(err) => Err(GatewayError::MalformedBody(err.to_string())),
        }
    }
}

#[async_trait]
impl SupplierGateway for HttpSupplierGateway {
    async fn place_order(
        &self,
        credentials: &SupplierCredentials,
        submission: &OrderSubmission,
    ) -> Result<NormalizedSupplierResult, Box<dyn std::error::Error + Send + Sync>> {
        let mut params = vec![
            ("serviceid", submission.supplier_service_id.clone()),
            ("reference", submission.reference.clone()),
        ];
        if let Some(imei) = &submission.imei {
            params.push(("imei", imei.clone()));
        }
        if let Some(file) = &submission.file {
            params.push(("filename", file.name.clone()));
            params.push(("file", file.data.clone()));
        }

        let raw = self.call(credentials, ACTION_PLACE_ORDER, params).await?;
        Ok(normalize_response(raw))
    }

    async fn check_status(
        &self,
        credentials: &SupplierCredentials,
        supplier_order_id: &str,
    ) -> Result<NormalizedSupplierResult, Box<dyn std::error::Error + Send + Sync>> {
        let params = vec![("orderid", supplier_order_id.to_string())];
        let raw = self.call(credentials, ACTION_CHECK_ORDER, params).await?;
        Ok(normalize_response(raw))
    }

    async fn get_balance(
        &self,
        credentials: &SupplierCredentials,
    ) -> Result<SupplierAccountBalance, Box<dyn std::error::Error + Send + Sync>> {
        let raw = self.call(credentials, ACTION_BALANCE, Vec::new()).await?;
        let result = normalize_response(raw);
        if !result.is_success {
            return Err(Box::new(GatewayError::MalformedBody(
                result
                    .error_message
                    .unwrap_or_else(|| "balance query failed".to_string()),
            )));
        }

        let balance = probe_string(&result.raw_response, BALANCE_KEYS)
            .unwrap_or_else(|| "0".to_string());
        let currency = probe_string(&result.raw_response, &["currency"]);
        Ok(SupplierAccountBalance { balance, currency })
    }

    async fn list_services(
        &self,
        credentials: &SupplierCredentials,
    ) -> Result<Vec<SupplierService>, Box<dyn std::error::Error + Send + Sync>> {
        let raw = self.call(credentials, ACTION_SERVICE_LIST, Vec::new()).await?;

        let mut services = Vec::new();
        if let Some(entries) = probe_array(&raw, SERVICE_LIST_KEYS) {
            for entry in entries {
                let Some(service_id) = probe_string(entry, SERVICE_ID_KEYS) else {
                    continue;
                };
                let name = probe_string(entry, SERVICE_NAME_KEYS)
                    .unwrap_or_else(|| format!("Service {}", service_id));
                services.push(SupplierService {
                    service_id,
                    name,
                    price_cents: probe_price_cents(entry, SERVICE_PRICE_KEYS),
                });
            }
        }

        tracing::debug!(count = services.len(), "supplier service list fetched");
        Ok(services)
    }
}
