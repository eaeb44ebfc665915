//! Outbound email transport.

use serde_json::json;

use crate::retry::DispatchError;

/// Sends one rendered message to one address.
#[allow(async_fn_in_trait)]
pub trait DeliveryClient {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DispatchError>;
}

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Email delivery via the Resend HTTP API.
#[derive(Clone)]
pub struct ResendClient {
    http: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendClient {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

impl DeliveryClient for ResendClient {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DispatchError> {
        let response = self
            .http
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            // Connect/timeout errors never reached the API and may succeed later
            .map_err(|e| DispatchError::DeliveryTransient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to, subject, "Email accepted by transport");
            return Ok(());
        }

        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable response body>".to_string());

        // 429 and 5xx are worth retrying; any other 4xx means the request
        // itself is bad and will fail identically next time.
        if status.as_u16() == 429 || status.is_server_error() {
            Err(DispatchError::DeliveryTransient(format!(
                "transport returned {}: {}",
                status, detail
            )))
        } else {
            Err(DispatchError::DeliveryRejected(format!(
                "transport returned {}: {}",
                status, detail
            )))
        }
    }
}
