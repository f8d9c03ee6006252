use crate::encoding::{calculate_sms_cost, SmsCostBreakdown};
use keyrelay_core::models::Tenant;
use keyrelay_core::repository::{CustomerRepository, TenantRepository};
use keyrelay_core::sms::{SmsCredentials, SmsMessage, SmsTransport};
use keyrelay_core::vault::CredentialVault;
use keyrelay_shared::money::{format_cents, Cents};
use keyrelay_shared::pii::{mask_msisdn, Masked};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Why a dispatch was skipped without error. Skips are policy outcomes, not
/// failures: the caller's own operation is unaffected.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    CustomerOptedOut,
    NoPhoneNumber,
    TenantDisabled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::CustomerOptedOut => "customer has SMS notifications disabled",
            SkipReason::NoPhoneNumber => "customer has no phone number on file",
            SkipReason::TenantDisabled => "SMS notifications are disabled for this tenant",
        };
        f.write_str(text)
    }
}

/// Ledger shortfall details attached to an insufficient-funds failure.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerShortfall {
    pub required_cents: Cents,
    pub available_cents: Cents,
}

/// Result of one dispatch attempt.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchOutcome {
    Sent {
        message_id: String,
        cost: SmsCostBreakdown,
        warnings: Vec<String>,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        error: String,
        cost: Option<SmsCostBreakdown>,
        warnings: Vec<String>,
        shortfall: Option<LedgerShortfall>,
    },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }

    fn failed(error: impl Into<String>) -> Self {
        DispatchOutcome::Failed {
            error: error.into(),
            cost: None,
            warnings: Vec::new(),
            shortfall: None,
        }
    }
}

/// Cost estimate for a message against a tenant's ledger, without sending.
#[derive(Debug, Serialize)]
pub struct CostEstimate {
    #[serde(flatten)]
    pub breakdown: SmsCostBreakdown,
    pub can_afford: bool,
    pub balance_cents: Cents,
}

/// Orchestrates sending one SMS: policy gates, cost calculation, ledger
/// check, transport call, ledger deduction.
///
/// Policy gates short-circuit with a skip; only missing/undecryptable
/// credentials and downstream failures produce errors. The ledger is
/// debited after a successful transport call only, so undelivered messages
/// are never charged.
pub struct NotificationDispatcher {
    customers: Arc<dyn CustomerRepository>,
    tenants: Arc<dyn TenantRepository>,
    transport: Arc<dyn SmsTransport>,
    vault: Arc<CredentialVault>,
    default_cost_per_segment_cents: Cents,
}

impl NotificationDispatcher {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        tenants: Arc<dyn TenantRepository>,
        transport: Arc<dyn SmsTransport>,
        vault: Arc<CredentialVault>,
        default_cost_per_segment_cents: Cents,
    ) -> Self {
        Self {
            customers,
            tenants,
            transport,
            vault,
            default_cost_per_segment_cents,
        }
    }

    pub async fn dispatch(&self, tenant_id: Uuid, customer_id: Uuid, text: &str) -> DispatchOutcome {
        let customer = match self.customers.get(tenant_id, customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => return DispatchOutcome::failed("customer not found"),
            Err(err) => return DispatchOutcome::failed(format!("customer lookup failed: {err}")),
        };

        if !customer.sms_enabled {
            return DispatchOutcome::Skipped {
                reason: SkipReason::CustomerOptedOut,
            };
        }

        let Some(phone) = customer.phone.clone() else {
            return DispatchOutcome::Skipped {
                reason: SkipReason::NoPhoneNumber,
            };
        };

        let tenant = match self.tenants.get(tenant_id).await {
            Ok(Some(tenant)) => tenant,
            Ok(None) => return DispatchOutcome::failed("tenant not found"),
            Err(err) => return DispatchOutcome::failed(format!("tenant lookup failed: {err}")),
        };

        if !tenant.sms_enabled {
            return DispatchOutcome::Skipped {
                reason: SkipReason::TenantDisabled,
            };
        }

        // Missing or undecryptable credentials are a configuration error,
        // not a policy skip.
        let credentials = match self.decrypt_credentials(&tenant) {
            Ok(credentials) => credentials,
            Err(error) => return DispatchOutcome::failed(error),
        };

        let cost = calculate_sms_cost(text, tenant.sms_unit_price(self.default_cost_per_segment_cents));
        let mut warnings = unicode_warnings(&cost);

        if tenant.sms_balance_cents < cost.total_cost_cents {
            return DispatchOutcome::Failed {
                error: "insufficient SMS balance".to_string(),
                shortfall: Some(LedgerShortfall {
                    required_cents: cost.total_cost_cents,
                    available_cents: tenant.sms_balance_cents,
                }),
                cost: Some(cost),
                warnings,
            };
        }

        let message = SmsMessage {
            to: phone,
            text: text.to_string(),
        };

        let receipt = match self.transport.send(&credentials, &message).await {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    to = %mask_msisdn(&message.to),
                    "SMS transport failed: {err}"
                );
                return DispatchOutcome::Failed {
                    error: err.to_string(),
                    cost: Some(cost),
                    warnings,
                    shortfall: None,
                };
            }
        };

        match self
            .tenants
            .try_debit_sms_ledger(tenant_id, cost.total_cost_cents)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                // A concurrent dispatch drained the ledger between the
                // pre-check and the debit. The message is already out, so
                // report success and flag the uncharged send.
                tracing::warn!(
                    tenant_id = %tenant_id,
                    amount = cost.total_cost_cents,
                    "SMS ledger debit lost the race, message sent uncharged"
                );
                warnings.push("message sent but ledger debit failed".to_string());
            }
            Err(err) => {
                tracing::error!(tenant_id = %tenant_id, "SMS ledger debit failed: {err}");
                warnings.push("message sent but ledger debit failed".to_string());
            }
        }

        tracing::info!(
            tenant_id = %tenant_id,
            customer_id = %customer_id,
            segments = cost.segments,
            cost = %format_cents(cost.total_cost_cents),
            "SMS dispatched"
        );

        DispatchOutcome::Sent {
            message_id: receipt.message_id,
            cost,
            warnings,
        }
    }

    /// Cost and affordability for a message without dispatching it.
    pub async fn estimate(
        &self,
        tenant_id: Uuid,
        text: &str,
    ) -> Result<CostEstimate, Box<dyn std::error::Error + Send + Sync>> {
        let tenant = self
            .tenants
            .get(tenant_id)
            .await?
            .ok_or("tenant not found")?;

        let breakdown =
            calculate_sms_cost(text, tenant.sms_unit_price(self.default_cost_per_segment_cents));
        Ok(CostEstimate {
            can_afford: tenant.sms_balance_cents >= breakdown.total_cost_cents,
            balance_cents: tenant.sms_balance_cents,
            breakdown,
        })
    }

    fn decrypt_credentials(&self, tenant: &Tenant) -> Result<SmsCredentials, String> {
        let (Some(ciphertext), Some(sender_id)) = (&tenant.sms_api_key_enc, &tenant.sms_sender_id)
        else {
            return Err("SMS provider credentials not configured".to_string());
        };

        let api_key = self
            .vault
            .decrypt(ciphertext)
            .map_err(|err| format!("cannot decrypt SMS credentials: {err}"))?;

        Ok(SmsCredentials {
            api_key: Masked(api_key),
            sender_id: sender_id.clone(),
        })
    }
}

fn unicode_warnings(cost: &SmsCostBreakdown) -> Vec<String> {
    if !cost.is_unicode() {
        return Vec::new();
    }
    let chars: String = cost
        .non_standard_chars
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        format!("message contains non-standard characters: {chars}"),
        format!(
            "Unicode messages are more expensive ({} segment(s) at 70-character capacity)",
            cost.segments
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keyrelay_core::models::Customer;
    use keyrelay_core::sms::SmsReceipt;
    use keyrelay_core::Environment;
    use std::sync::Mutex;

    struct FakeCustomerRepo {
        customer: Customer,
    }

    #[async_trait]
    impl CustomerRepository for FakeCustomerRepo {
        async fn get(
            &self,
            tenant_id: Uuid,
            customer_id: Uuid,
        ) -> Result<Option<Customer>, Box<dyn std::error::Error + Send + Sync>> {
            if self.customer.tenant_id == tenant_id && self.customer.id == customer_id {
                Ok(Some(self.customer.clone()))
            } else {
                Ok(None)
            }
        }
    }

    struct FakeTenantRepo {
        tenant: Mutex<Tenant>,
    }

    #[async_trait]
    impl TenantRepository for FakeTenantRepo {
        async fn get(
            &self,
            tenant_id: Uuid,
        ) -> Result<Option<Tenant>, Box<dyn std::error::Error + Send + Sync>> {
            let tenant = self.tenant.lock().unwrap();
            if tenant.id == tenant_id {
                Ok(Some(tenant.clone()))
            } else {
                Ok(None)
            }
        }

        async fn try_debit_sms_ledger(
            &self,
            tenant_id: Uuid,
            amount_cents: Cents,
        ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
            let mut tenant = self.tenant.lock().unwrap();
            if tenant.id != tenant_id || tenant.sms_balance_cents < amount_cents {
                return Ok(false);
            }
            tenant.sms_balance_cents -= amount_cents;
            Ok(true)
        }
    }

    struct RecordingTransport {
        sent: Mutex<Vec<SmsMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl SmsTransport for RecordingTransport {
        async fn send(
            &self,
            _credentials: &SmsCredentials,
            message: &SmsMessage,
        ) -> Result<SmsReceipt, Box<dyn std::error::Error + Send + Sync>> {
            if self.fail {
                return Err("provider unreachable".into());
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(SmsReceipt {
                message_id: "msg-1".to_string(),
            })
        }
    }

    struct Harness {
        dispatcher: NotificationDispatcher,
        tenants: Arc<FakeTenantRepo>,
        transport: Arc<RecordingTransport>,
        tenant_id: Uuid,
        customer_id: Uuid,
    }

    fn harness(customize: impl FnOnce(&mut Customer, &mut Tenant), fail_transport: bool) -> Harness {
        let vault = Arc::new(CredentialVault::new(
            &Environment::new(false, Some("test-master-key".into())).unwrap(),
        ));
        let tenant_id = Uuid::from_u128(1);
        let customer_id = Uuid::from_u128(2);

        let mut customer = Customer {
            id: customer_id,
            tenant_id,
            email: Some("c@example.com".to_string()),
            phone: Some("+15551234567".to_string()),
            sms_enabled: true,
            balance_cents: 0,
            created_at: chrono::Utc::now(),
        };
        let mut tenant = Tenant {
            id: tenant_id,
            company_name: "Acme GSM".to_string(),
            sms_enabled: true,
            sms_sender_id: Some("ACME".to_string()),
            sms_api_key_enc: Some(vault.encrypt("provider-api-key").unwrap()),
            sms_cost_per_segment_cents: 5,
            sms_balance_cents: 40,
        };
        customize(&mut customer, &mut tenant);

        let tenants = Arc::new(FakeTenantRepo {
            tenant: Mutex::new(tenant),
        });
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
            fail: fail_transport,
        });

        let dispatcher = NotificationDispatcher::new(
            Arc::new(FakeCustomerRepo { customer }),
            tenants.clone(),
            transport.clone(),
            vault,
            5,
        );

        Harness {
            dispatcher,
            tenants,
            transport,
            tenant_id,
            customer_id,
        }
    }

    fn ledger_of(h: &Harness) -> Cents {
        h.tenants.tenant.lock().unwrap().sms_balance_cents
    }

    #[tokio::test]
    async fn test_single_segment_send_debits_ledger() {
        let h = harness(|_, _| {}, false);
        let text = "a".repeat(140);

        let outcome = h.dispatcher.dispatch(h.tenant_id, h.customer_id, &text).await;

        match outcome {
            DispatchOutcome::Sent { cost, warnings, .. } => {
                assert_eq!(cost.segments, 1);
                assert_eq!(cost.total_cost_cents, 5);
                assert!(warnings.is_empty());
            }
            other => panic!("expected Sent, got {:?}", other),
        }
        assert_eq!(ledger_of(&h), 35);
        assert_eq!(h.transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_ledger_fails_without_sending() {
        let h = harness(|_, tenant| tenant.sms_balance_cents = 1, false);
        let text = "a".repeat(140);

        let outcome = h.dispatcher.dispatch(h.tenant_id, h.customer_id, &text).await;

        match outcome {
            DispatchOutcome::Failed { shortfall, .. } => {
                let shortfall = shortfall.expect("shortfall details");
                assert_eq!(shortfall.required_cents, 5);
                assert_eq!(shortfall.available_cents, 1);
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(ledger_of(&h), 1);
        assert!(h.transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_opted_out_customer_is_skipped() {
        let h = harness(|customer, _| customer.sms_enabled = false, false);
        let outcome = h.dispatcher.dispatch(h.tenant_id, h.customer_id, "hi").await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Skipped {
                reason: SkipReason::CustomerOptedOut
            }
        ));
        assert!(h.transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_phone_is_skipped() {
        let h = harness(|customer, _| customer.phone = None, false);
        let outcome = h.dispatcher.dispatch(h.tenant_id, h.customer_id, "hi").await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Skipped {
                reason: SkipReason::NoPhoneNumber
            }
        ));
    }

    #[tokio::test]
    async fn test_tenant_disabled_is_skipped() {
        let h = harness(|_, tenant| tenant.sms_enabled = false, false);
        let outcome = h.dispatcher.dispatch(h.tenant_id, h.customer_id, "hi").await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Skipped {
                reason: SkipReason::TenantDisabled
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_an_error_not_a_skip() {
        let h = harness(|_, tenant| tenant.sms_api_key_enc = None, false);
        let outcome = h.dispatcher.dispatch(h.tenant_id, h.customer_id, "hi").await;
        match outcome {
            DispatchOutcome::Failed { error, .. } => {
                assert!(error.contains("credentials not configured"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecryptable_credentials_is_an_error() {
        let h = harness(
            |_, tenant| tenant.sms_api_key_enc = Some("bm90LXZhbGlk".to_string()),
            false,
        );
        let outcome = h.dispatcher.dispatch(h.tenant_id, h.customer_id, "hi").await;
        match outcome {
            DispatchOutcome::Failed { error, .. } => {
                assert!(error.contains("cannot decrypt"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_charge() {
        let h = harness(|_, _| {}, true);
        let outcome = h.dispatcher.dispatch(h.tenant_id, h.customer_id, "hi").await;
        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert_eq!(ledger_of(&h), 40);
    }

    #[tokio::test]
    async fn test_unicode_message_carries_warnings() {
        let h = harness(|_, _| {}, false);
        let outcome = h
            .dispatcher
            .dispatch(h.tenant_id, h.customer_id, "код готов ✓")
            .await;
        match outcome {
            DispatchOutcome::Sent { warnings, cost, .. } => {
                assert!(cost.is_unicode());
                assert!(warnings.iter().any(|w| w.contains("non-standard characters")));
            }
            other => panic!("expected Sent, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_estimate_reports_affordability() {
        let h = harness(|_, tenant| tenant.sms_balance_cents = 7, false);
        let estimate = h
            .dispatcher
            .estimate(h.tenant_id, &"a".repeat(200))
            .await
            .unwrap();

        // 200 standard units => 2 segments => 10 cents against a 7c ledger.
        assert_eq!(estimate.breakdown.segments, 2);
        assert!(!estimate.can_afford);
        assert_eq!(estimate.balance_cents, 7);
    }
}
