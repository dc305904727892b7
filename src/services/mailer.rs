use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{Email, Mailer};
use crate::error::AppError;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Sends mail through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: Option<String>,
    from: String,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(client: Client, api_key: Option<String>, from: &str) -> Self {
        Self {
            client,
            api_key,
            from: from.to_string(),
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[tracing::instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    async fn send(&self, email: Email) -> Result<(), AppError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AppError::Upstream("email delivery is not configured".to_string()));
        };

        let mut payload = json!({
            "from": self.from,
            "to": [email.to],
            "subject": email.subject,
            "html": email.html,
        });
        if let Some(reply_to) = email.reply_to {
            payload["reply_to"] = json!(reply_to);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Resend returned {}: {}", status, text)));
        }

        tracing::info!("email sent");
        Ok(())
    }
}
