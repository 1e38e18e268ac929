pub mod outcome;
pub mod spam;
pub mod submission;
pub mod validation;
