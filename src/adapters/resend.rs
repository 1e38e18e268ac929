use crate::config::DeliveryConfig;
use crate::services::delivery::{DeliveryChannel, DeliveryError, OutboundEmail};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Delivery over the Resend HTTP API.
#[derive(Debug, Clone)]
pub struct ResendChannel {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
    to: String,
}

impl ResendChannel {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &DeliveryConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}/emails", config.api_url.trim_end_matches('/')),
            api_key: config.usable_api_key().map(ToString::to_string),
            from: config.from.clone(),
            to: config.to.clone(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for ResendChannel {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn deliver(&self, email: &OutboundEmail) -> Result<(), DeliveryError> {
        let api_key = self.api_key.as_deref().ok_or(DeliveryError::Unconfigured)?;

        let request = SendEmailRequest {
            from: &self.from,
            to: [&self.to],
            reply_to: &email.reply_to,
            subject: &email.subject,
            text: &email.text,
            html: &email.html,
        };

        let response = self.http.post(&self.endpoint).bearer_auth(api_key).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status: status.as_u16(), body });
        }

        tracing::debug!(status = %status.as_u16(), "Delivery service accepted message");
        Ok(())
    }
}
