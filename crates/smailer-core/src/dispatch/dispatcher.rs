//! Turns one event into one sent email.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::format::{MailContext, format_body, format_subject};
use super::mail::OutgoingMail;
use super::validation::{ValidationError, validate_recipients, validate_sender};
use crate::event::PhoneEvent;
use crate::ports::{Device, MailTransport, SenderAccounts, TransportError};
use crate::settings::Settings;

/// Why an event could not be emailed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Recipients or sender are missing or invalid. Retrying will not help
    /// until the user fixes the settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The sender account was rejected; its stored identity has been removed.
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Network trouble, a server failure or a timeout.
    #[error("Transient error: {0}")]
    Transient(String),
}

/// Discriminant of a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchErrorKind {
    /// See [`DispatchError::Configuration`].
    Configuration,
    /// See [`DispatchError::Authorization`].
    Authorization,
    /// See [`DispatchError::Transient`].
    Transient,
}

impl DispatchError {
    /// The kind of failure.
    #[must_use]
    pub const fn kind(&self) -> DispatchErrorKind {
        match self {
            Self::Configuration(_) => DispatchErrorKind::Configuration,
            Self::Authorization(_) => DispatchErrorKind::Authorization,
            Self::Transient(_) => DispatchErrorKind::Transient,
        }
    }

    fn from_validation(errors: &[ValidationError]) -> Self {
        let message = errors
            .iter()
            .map(ValidationError::message)
            .collect::<Vec<_>>()
            .join("; ");
        Self::Configuration(message)
    }
}

/// Builds event mails and hands them to the transport.
pub struct MailDispatcher<T> {
    transport: Arc<T>,
    accounts: Arc<dyn SenderAccounts>,
    device: Arc<dyn Device>,
}

impl<T: MailTransport> MailDispatcher<T> {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        accounts: Arc<dyn SenderAccounts>,
        device: Arc<dyn Device>,
    ) -> Self {
        Self {
            transport,
            accounts,
            device,
        }
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Builds the mail for an event from the given sender.
    #[must_use]
    pub fn compose(&self, event: &PhoneEvent, settings: &Settings, sender: &str) -> OutgoingMail {
        let context = MailContext {
            contact_name: self.device.contact_name(&event.phone),
            reply_address: Some(sender.to_string()),
            ..MailContext::new(self.device.device_name())
        };

        let mut mail = OutgoingMail::new(
            sender,
            format_subject(event),
            format_body(event, &settings.content, &context),
        )
        .reply_to(sender);

        for recipient in settings
            .recipients
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
        {
            mail = mail.to(recipient);
        }

        mail
    }

    /// Emails one event.
    ///
    /// The transport is not contacted when the configuration is invalid.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] describing why the mail was not sent.
    pub async fn dispatch(&self, event: &PhoneEvent, settings: &Settings) -> Result<(), DispatchError> {
        validate_recipients(&settings.recipients).map_err(|e| DispatchError::from_validation(&e))?;

        let sender = self.accounts.sender().map_err(|e| {
            warn!("Failed to read sender account: {e}");
            DispatchError::Configuration(format!("Sender account unavailable: {e}"))
        })?;
        validate_sender(sender.as_deref())
            .map_err(|e| DispatchError::from_validation(std::slice::from_ref(&e)))?;
        let sender = sender.unwrap_or_default();

        let mail = self.compose(event, settings, sender.trim());
        debug!("Sending '{}' to {} recipient(s)", mail.subject, mail.to.len());

        let timeout = settings.send_timeout();
        match tokio::time::timeout(timeout, self.transport.send_mail(&mail)).await {
            Ok(Ok(())) => {
                info!("Sent '{}'", mail.subject);
                Ok(())
            }
            Ok(Err(e)) => Err(self.classify_transport_error(e)),
            Err(_) => {
                warn!("Sending '{}' timed out after {timeout:?}", mail.subject);
                Err(DispatchError::Transient(format!(
                    "Timed out after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }

    fn classify_transport_error(&self, error: TransportError) -> DispatchError {
        match error {
            TransportError::Authorization(message) => {
                warn!("Sender account rejected: {message}");
                if let Err(e) = self.accounts.remove_sender() {
                    warn!("Failed to remove rejected sender account: {e}");
                }
                DispatchError::Authorization(message)
            }
            TransportError::InvalidRecipient(message) => DispatchError::Configuration(message),
            TransportError::Connection(message) | TransportError::Server(message) => {
                debug!("Transient send failure: {message}");
                DispatchError::Transient(message)
            }
        }
    }
}
