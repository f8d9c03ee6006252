use async_trait::async_trait;
use keyrelay_shared::pii::Masked;

/// Decrypted SMS provider credentials for one tenant. The key is wrapped so
/// a stray debug log can never print it.
#[derive(Debug, Clone)]
pub struct SmsCredentials {
    pub api_key: Masked<String>,
    pub sender_id: String,
}

/// One outbound text message.
#[derive(Debug, Clone)]
pub struct SmsMessage {
    pub to: String,
    pub text: String,
}

/// Provider acknowledgement for a dispatched message.
#[derive(Debug, Clone)]
pub struct SmsReceipt {
    pub message_id: String,
}

/// Transport seam for the SMS provider. The dispatcher treats any `Err` as
/// a delivery failure: no ledger charge is made for undelivered messages.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    async fn send(
        &self,
        credentials: &SmsCredentials,
        message: &SmsMessage,
    ) -> Result<SmsReceipt, Box<dyn std::error::Error + Send + Sync>>;
}
