use crate::domain::submission::{Field, NormalizedSubmission, SubmissionInput, Violations};
use email_address::{EmailAddress, Options};
use regex::Regex;
use std::sync::LazyLock;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const EMAIL_MIN_CHARS: usize = 5;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 500;

/// Substrings that mark a message as carrying a link. Matched case-sensitively.
const LINK_MARKERS: [&str; 3] = ["http", "www", "href"];

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}' -]+$").expect("name pattern is a valid regex"));

const EMAIL_OPTIONS: Options = Options { minimum_sub_domains: 2, allow_domain_literal: false, allow_display_text: false };

pub mod messages {
    pub const FIRST_NAME_REQUIRED: &str = "First name is required.";
    pub const FIRST_NAME_TOO_SHORT: &str = "First name must be at least 2 characters.";
    pub const FIRST_NAME_TOO_LONG: &str = "First name must be less than 50 characters.";
    pub const FIRST_NAME_CHARSET: &str = "First name must contain only letters.";
    pub const LAST_NAME_INVALID: &str = "Last name must be 2-50 characters and contain only letters.";
    pub const EMAIL_REQUIRED: &str = "Email is required.";
    pub const EMAIL_INVALID: &str = "Email must be a valid email address.";
    pub const EMAIL_TOO_SHORT: &str = "Email must be at least 5 characters.";
    pub const EMAIL_TOO_LONG: &str = "Email must be less than 100 characters.";
    pub const MESSAGE_REQUIRED: &str = "Message is required.";
    pub const MESSAGE_TOO_SHORT: &str = "Message must be at least 10 characters.";
    pub const MESSAGE_TOO_LONG: &str = "Message must be less than 500 characters.";
    pub const MESSAGE_HAS_LINK: &str = "Message must not contain URLs.";
}

/// Validates raw input and produces a normalized submission.
///
/// Every field is checked independently, so several fields can report at once. Within a field
/// only the first failing rule is reported. Values are trimmed before any rule runs.
///
/// # Errors
/// Returns the collected `Violations` if any rule fails.
pub fn validate(input: &SubmissionInput) -> Result<NormalizedSubmission, Violations> {
    let mut violations = Violations::default();

    let first_name = trimmed(input.first_name.as_deref());
    if let Err(message) = check_first_name(first_name) {
        violations.record(Field::FirstName, message);
    }

    let last_name = trimmed(input.last_name.as_deref());
    if let Err(message) = check_last_name(last_name) {
        violations.record(Field::LastName, message);
    }

    let email = trimmed(input.email.as_deref());
    if let Err(message) = check_email(email) {
        violations.record(Field::Email, message);
    }

    let message = trimmed(input.message.as_deref());
    if let Err(text) = check_message(message) {
        violations.record(Field::Message, text);
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(NormalizedSubmission {
        first_name: first_name.unwrap_or_default().to_string(),
        last_name: last_name.unwrap_or_default().to_string(),
        email: email.unwrap_or_default().to_string(),
        message: message.unwrap_or_default().to_string(),
    })
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn is_name(value: &str) -> bool {
    NAME_PATTERN.is_match(value)
}

fn check_first_name(value: Option<&str>) -> Result<(), &'static str> {
    let Some(value) = value else {
        return Err(messages::FIRST_NAME_REQUIRED);
    };
    let len = char_len(value);
    if len < NAME_MIN_CHARS {
        return Err(messages::FIRST_NAME_TOO_SHORT);
    }
    if len > NAME_MAX_CHARS {
        return Err(messages::FIRST_NAME_TOO_LONG);
    }
    if !is_name(value) {
        return Err(messages::FIRST_NAME_CHARSET);
    }
    Ok(())
}

fn check_last_name(value: Option<&str>) -> Result<(), &'static str> {
    match value {
        None | Some("") => Ok(()),
        Some(value) if (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&char_len(value)) && is_name(value) => Ok(()),
        Some(_) => Err(messages::LAST_NAME_INVALID),
    }
}

fn check_email(value: Option<&str>) -> Result<(), &'static str> {
    let Some(value) = value else {
        return Err(messages::EMAIL_REQUIRED);
    };
    if EmailAddress::parse_with_options(value, EMAIL_OPTIONS).is_err() {
        return Err(messages::EMAIL_INVALID);
    }
    let len = char_len(value);
    if len < EMAIL_MIN_CHARS {
        return Err(messages::EMAIL_TOO_SHORT);
    }
    if len > EMAIL_MAX_CHARS {
        return Err(messages::EMAIL_TOO_LONG);
    }
    Ok(())
}

fn check_message(value: Option<&str>) -> Result<(), &'static str> {
    let Some(value) = value else {
        return Err(messages::MESSAGE_REQUIRED);
    };
    let len = char_len(value);
    if len < MESSAGE_MIN_CHARS {
        return Err(messages::MESSAGE_TOO_SHORT);
    }
    if len > MESSAGE_MAX_CHARS {
        return Err(messages::MESSAGE_TOO_LONG);
    }
    if LINK_MARKERS.iter().any(|marker| value.contains(marker)) {
        return Err(messages::MESSAGE_HAS_LINK);
    }
    Ok(())
}
