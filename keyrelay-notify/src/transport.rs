use async_trait::async_trait;
use keyrelay_core::sms::{SmsCredentials, SmsMessage, SmsReceipt, SmsTransport};
use keyrelay_shared::pii::mask_msisdn;
use serde_json::{json, Value};
use std::time::Duration;

const MESSAGE_ID_KEYS: &[&str] = &["messageId", "id"];

#[derive(Debug, thiserror::Error)]
pub enum SmsTransportError {
    #[error("SMS transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("SMS provider rejected the message (HTTP {status}): {message}")]
    Provider { status: u16, message: String },
}

/// HTTP implementation of the SMS transport.
///
/// Posts `{channels: ["SMS"], destination: [{msisdn}], message: {text},
/// source}` with the tenant's API key header and expects a message
/// identifier on 2xx.
pub struct HttpSmsTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSmsTransport {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, SmsTransportError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SmsTransport for HttpSmsTransport {
    async fn send(
        &self,
        credentials: &SmsCredentials,
        message: &SmsMessage,
    ) -> Result<SmsReceipt, Box<dyn std::error::Error + Send + Sync>> {
        let payload = json!({
            "channels": ["SMS"],
            "destination": [{ "msisdn": message.to }],
            "message": { "text": message.text },
            "source": credentials.sender_id,
        });

        tracing::debug!(to = %mask_msisdn(&message.to), "dispatching SMS");

        let response = self
            .http
            .post(&self.endpoint)
            .header("key", &credentials.api_key.0)
            .json(&payload)
            .send()
            .await
            .map_err(SmsTransportError::Transport)?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("SMS provider request failed")
                .to_string();
            return Err(Box::new(SmsTransportError::Provider {
                status: status.as_u16(),
                message,
            }));
        }

        let message_id = MESSAGE_ID_KEYS
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        Ok(SmsReceipt { message_id })
    }
}
