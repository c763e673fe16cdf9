//! Ports to the collaborators that live outside the core.
//!
//! Async ports (`EventStore`, `FilterStore`, `MailTransport`) are used as
//! generic parameters. Synchronous ports (`Notifier`, `Device`,
//! `SenderAccounts`) are object safe and injected as `Arc<dyn _>`.

use std::future::Future;

use crate::Result;
use crate::credentials::CredentialResult;
use crate::dispatch::OutgoingMail;
use crate::event::{EventId, EventState, GeoCoordinates, PhoneEvent};
use crate::filter::PhoneEventFilter;

/// Durable record of events and their delivery state.
pub trait EventStore: Send + Sync {
    /// Loads one event.
    fn get(&self, id: EventId) -> impl Future<Output = Result<Option<PhoneEvent>>> + Send;

    /// Inserts a new event or overwrites the stored one with the same id.
    fn put(&self, event: &PhoneEvent) -> impl Future<Output = Result<EventId>> + Send;

    /// All events still waiting for delivery, oldest first.
    fn list_pending(&self) -> impl Future<Output = Result<Vec<PhoneEvent>>> + Send;

    /// Persists a state change for one event.
    fn update_state(&self, id: EventId, state: EventState)
    -> impl Future<Output = Result<()>> + Send;
}

/// Persistent home of the filter configuration.
pub trait FilterStore: Send + Sync {
    /// Loads the filter, or the default filter when none was saved.
    fn load(&self) -> impl Future<Output = Result<PhoneEventFilter>> + Send;

    /// Replaces the stored filter as one unit.
    fn save(&self, filter: &PhoneEventFilter) -> impl Future<Output = Result<()>> + Send;
}

/// Errors reported by a mail transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The account grant or credential was revoked or rejected.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// The server refused a recipient address.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Network failure.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server failed the request.
    #[error("Server error: {0}")]
    Server(String),
}

/// A message found in the sender account's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InboxMessage {
    /// Transport-specific message id.
    pub id: String,
    /// Declared sender (`From` header).
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

/// Outbound and inbound mail capability of the sender account.
pub trait MailTransport: Send + Sync {
    /// Sends one message.
    fn send_mail(
        &self,
        mail: &OutgoingMail,
    ) -> impl Future<Output = std::result::Result<(), TransportError>> + Send;

    /// Lists inbox messages matching a transport-specific query.
    fn list_inbox(
        &self,
        query: &str,
    ) -> impl Future<Output = std::result::Result<Vec<InboxMessage>, TransportError>> + Send;

    /// Marks a message as read.
    fn mark_read(
        &self,
        message_id: &str,
    ) -> impl Future<Output = std::result::Result<(), TransportError>> + Send;

    /// Moves a message to trash.
    fn trash(
        &self,
        message_id: &str,
    ) -> impl Future<Output = std::result::Result<(), TransportError>> + Send;
}

/// What a user notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// An event was emailed.
    MailSent,
    /// Recipients or sender are missing or invalid.
    ConfigurationError,
    /// The sender account must be re-authorized.
    AuthorizationError,
    /// A resend pass ended with undelivered events.
    ResendFailed,
    /// A remote command changed the filter.
    RemoteCommandApplied,
}

impl NotificationKind {
    /// Short title for display.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::MailSent => "Email sent",
            Self::ConfigurationError => "Check mail settings",
            Self::AuthorizationError => "Sender account needs attention",
            Self::ResendFailed => "Some events were not sent",
            Self::RemoteCommandApplied => "Filter changed remotely",
        }
    }
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    /// Shows a notification. Failures are the notifier's own business.
    fn notify(&self, kind: NotificationKind, text: &str);
}

/// Device-side lookups and side effects.
pub trait Device: Send + Sync {
    /// Name of the device, shown in mail footers.
    fn device_name(&self) -> String;

    /// Contact name for a phone number.
    fn contact_name(&self, _phone: &str) -> Option<String> {
        None
    }

    /// Most recent known device location.
    fn last_known_location(&self) -> Option<GeoCoordinates> {
        None
    }

    /// Marks the SMS an event came from as read on the device.
    fn mark_sms_read(&self, _event: &PhoneEvent) {}
}

/// Storage of the sender account identity.
pub trait SenderAccounts: Send + Sync {
    /// The configured sender address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn sender(&self) -> CredentialResult<Option<String>>;

    /// Forgets the sender so the user is asked to pick one again.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove_sender(&self) -> CredentialResult<()>;
}
