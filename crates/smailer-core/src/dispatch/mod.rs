//! Email composition and sending.

mod dispatcher;
mod format;
mod mail;
mod validation;

pub use dispatcher::{DispatchError, DispatchErrorKind, MailDispatcher};
pub use format::{MailContext, SUBJECT_PREFIX, format_body, format_subject};
pub use mail::OutgoingMail;
pub use validation::{
    ValidationError, ValidationResult, extract_address, is_valid_email, same_address,
    validate_recipients, validate_sender,
};
