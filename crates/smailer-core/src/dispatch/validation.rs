//! Recipient and sender validation.

/// Validation error for mail configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No recipient configured.
    NoRecipients,
    /// A recipient address is malformed.
    InvalidRecipient(String),
    /// No sender account configured.
    NoSender,
    /// The sender address is malformed.
    InvalidSender(String),
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoRecipients => "At least one recipient is required".to_string(),
            Self::InvalidRecipient(address) => format!("Invalid recipient address: {address}"),
            Self::NoSender => "Sender account is required".to_string(),
            Self::InvalidSender(address) => format!("Invalid sender address: {address}"),
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NoRecipients | Self::InvalidRecipient(_) => "recipients",
            Self::NoSender | Self::InvalidSender(_) => "sender",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of a validation.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a recipient list.
///
/// # Errors
///
/// Returns every problem found: an empty list, or each malformed address.
pub fn validate_recipients(recipients: &[String]) -> ValidationResult {
    let addresses: Vec<&str> = recipients
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();

    if addresses.is_empty() {
        return Err(vec![ValidationError::NoRecipients]);
    }

    let errors: Vec<ValidationError> = addresses
        .into_iter()
        .filter(|address| !is_valid_email(extract_address(address)))
        .map(|address| ValidationError::InvalidRecipient(address.to_string()))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the sender address.
///
/// # Errors
///
/// Returns an error if the sender is missing or malformed.
pub fn validate_sender(sender: Option<&str>) -> Result<(), ValidationError> {
    match sender.map(str::trim).filter(|s| !s.is_empty()) {
        None => Err(ValidationError::NoSender),
        Some(address) if !is_valid_email(extract_address(address)) => {
            Err(ValidationError::InvalidSender(address.to_string()))
        }
        Some(_) => Ok(()),
    }
}

/// The bare address of a `Display Name <address>` mailbox.
#[must_use]
pub fn extract_address(mailbox: &str) -> &str {
    let mailbox = mailbox.trim();
    match (mailbox.rfind('<'), mailbox.rfind('>')) {
        (Some(start), Some(end)) if start < end => mailbox[start + 1..end].trim(),
        _ => mailbox,
    }
}

/// Whether two mailboxes denote the same address, ignoring case and display names.
#[must_use]
pub fn same_address(a: &str, b: &str) -> bool {
    let a = extract_address(a);
    !a.is_empty() && a.eq_ignore_ascii_case(extract_address(b))
}

/// Basic email validation.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    // Must contain exactly one @
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || local.contains(char::is_whitespace) {
        return false;
    }

    // Domain must contain at least one dot and not be empty
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    // Domain parts must not be empty
    !domain.split('.').any(str::is_empty)
}
