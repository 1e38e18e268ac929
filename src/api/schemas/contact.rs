use crate::domain::submission::{Field, Violations};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of every response on the submission endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    /// Per-field violations, present only on validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<Field, String>>,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), errors: None }
    }

    #[must_use]
    pub fn validation(violations: &Violations) -> Self {
        Self {
            message: format!("Validation failed: {}", violations.joined()),
            errors: Some(violations.iter().map(|(field, message)| (field, message.to_string())).collect()),
        }
    }
}
