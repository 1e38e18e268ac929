use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fields of a contact submission that carry validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Message,
}

impl Field {
    pub const ALL: [Self; 4] = [Self::FirstName, Self::LastName, Self::Email, Self::Message];

    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The payload was not a JSON object with string-typed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedPayload;

/// Raw values as supplied by a caller. Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Hidden form element. Humans never fill it in.
    #[serde(default, alias = "decoyField", skip_serializing_if = "Option::is_none")]
    pub honeypot: Option<String>,
}

impl SubmissionInput {
    /// Decodes a transport payload.
    ///
    /// Unknown keys are ignored and `null` counts as absent.
    ///
    /// # Errors
    /// Returns `MalformedPayload` if the bytes are not a JSON object, or a known field is not a string.
    pub fn from_json(payload: &[u8]) -> Result<Self, MalformedPayload> {
        let value: serde_json::Value = serde_json::from_slice(payload).map_err(|_| MalformedPayload)?;
        if !value.is_object() {
            return Err(MalformedPayload);
        }
        serde_json::from_value(value).map_err(|_| MalformedPayload)
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::FirstName => self.first_name.as_deref(),
            Field::LastName => self.last_name.as_deref(),
            Field::Email => self.email.as_deref(),
            Field::Message => self.message.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Email => &mut self.email,
            Field::Message => &mut self.message,
        };
        *slot = Some(value.into());
    }
}

/// A submission that passed every validation rule, trimmed and bounds-checked.
///
/// Only [`crate::domain::validation::validate`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSubmission {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) message: String,
}

impl NormalizedSubmission {
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Empty when the submitter left it out.
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    /// Converts back into raw input form, e.g. for re-validation.
    #[must_use]
    pub fn to_input(&self) -> SubmissionInput {
        SubmissionInput {
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            email: Some(self.email.clone()),
            message: Some(self.message.clone()),
            honeypot: None,
        }
    }
}

/// Field-level violations, at most one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(BTreeMap<Field, &'static str>);

impl Violations {
    /// Records a violation unless the field already has one.
    pub fn record(&mut self, field: Field, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    /// Messages in field order, joined the way the wire contract reports them.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0.values().copied().collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}
