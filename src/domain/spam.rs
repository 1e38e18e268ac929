use crate::domain::submission::SubmissionInput;

/// Flags submissions whose decoy field was filled in.
///
/// The decoy is never rendered to humans, so any content at all marks an automated submitter.
#[must_use]
pub fn is_spam(input: &SubmissionInput) -> bool {
    input.honeypot.as_deref().is_some_and(|value| !value.is_empty())
}
