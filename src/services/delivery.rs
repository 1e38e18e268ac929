use crate::domain::submission::NormalizedSubmission;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Delivery channel is not configured")]
    Unconfigured,
    #[error("Delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Delivery service responded with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Message handed to the delivery channel. Built only from validated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub subject: String,
    pub reply_to: String,
    pub text: String,
    pub html: String,
}

impl OutboundEmail {
    #[must_use]
    pub fn compose(submission: &NormalizedSubmission) -> Self {
        let full_name = submission.full_name();
        let text = format!(
            "New contact form submission\n\nName: {full_name}\nEmail: {}\n\nMessage:\n{}\n",
            submission.email(),
            submission.message()
        );
        let html = format!(
            "<h2>New contact form submission</h2>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Message:</strong></p>\
             <p style=\"white-space: pre-wrap\">{}</p>",
            escape_html(&full_name),
            escape_html(submission.email()),
            escape_html(submission.message())
        );

        Self { subject: format!("New message from {full_name}"), reply_to: submission.email().to_string(), text, html }
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// External system that transmits composed messages.
#[async_trait]
pub trait DeliveryChannel: Send + Sync + std::fmt::Debug {
    /// Whether the channel has the credentials it needs to attempt delivery.
    fn is_configured(&self) -> bool;

    /// Transmits one message.
    ///
    /// # Errors
    /// Returns `DeliveryError` if the channel is unconfigured, unreachable, or refuses the message.
    async fn deliver(&self, email: &OutboundEmail) -> Result<(), DeliveryError>;
}
