//! In-memory fakes of the ports for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::credentials::CredentialResult;
use crate::dispatch::OutgoingMail;
use crate::event::{GeoCoordinates, PhoneEvent};
use crate::ports::{
    Device, InboxMessage, MailTransport, NotificationKind, Notifier, SenderAccounts,
    TransportError,
};

/// Records sent mail and serves a fixed inbox.
#[derive(Default)]
pub struct FakeTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    send_failures: Mutex<VecDeque<TransportError>>,
    send_delay: Option<Duration>,
    inbox: Mutex<Vec<InboxMessage>>,
    list_failure: Mutex<Option<TransportError>>,
    read: Mutex<Vec<String>>,
    trashed: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub fn fail_next_send(&self, error: TransportError) {
        self.send_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_listing(&self, error: TransportError) {
        *self.list_failure.lock().unwrap() = Some(error);
    }

    pub fn deliver_to_inbox(&self, message: InboxMessage) {
        self.inbox.lock().unwrap().push(message);
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn read(&self) -> Vec<String> {
        self.read.lock().unwrap().clone()
    }

    pub fn trashed(&self) -> Vec<String> {
        self.trashed.lock().unwrap().clone()
    }
}

impl MailTransport for FakeTransport {
    async fn send_mail(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.send_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }

    async fn list_inbox(&self, _query: &str) -> Result<Vec<InboxMessage>, TransportError> {
        if let Some(error) = self.list_failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.inbox.lock().unwrap().clone())
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), TransportError> {
        self.read.lock().unwrap().push(message_id.to_string());
        Ok(())
    }

    async fn trash(&self, message_id: &str) -> Result<(), TransportError> {
        self.trashed.lock().unwrap().push(message_id.to_string());
        self.inbox.lock().unwrap().retain(|m| m.id != message_id);
        Ok(())
    }
}

/// Sender identity held in memory.
pub struct StaticAccounts {
    sender: Mutex<Option<String>>,
}

impl StaticAccounts {
    pub fn new(sender: Option<&str>) -> Self {
        Self {
            sender: Mutex::new(sender.map(str::to_string)),
        }
    }
}

impl SenderAccounts for StaticAccounts {
    fn sender(&self) -> CredentialResult<Option<String>> {
        Ok(self.sender.lock().unwrap().clone())
    }

    fn remove_sender(&self) -> CredentialResult<()> {
        *self.sender.lock().unwrap() = None;
        Ok(())
    }
}

/// Device with a fixed name, contacts and location.
#[derive(Default)]
pub struct FakeDevice {
    name: String,
    contacts: HashMap<String, String>,
    location: Option<GeoCoordinates>,
    marked_read: Mutex<Vec<String>>,
}

impl FakeDevice {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: GeoCoordinates) -> Self {
        self.location = Some(location);
        self
    }

    pub fn marked_read(&self) -> Vec<String> {
        self.marked_read.lock().unwrap().clone()
    }
}

impl Device for FakeDevice {
    fn device_name(&self) -> String {
        self.name.clone()
    }

    fn contact_name(&self, phone: &str) -> Option<String> {
        self.contacts.get(phone).cloned()
    }

    fn last_known_location(&self) -> Option<GeoCoordinates> {
        self.location
    }

    fn mark_sms_read(&self, event: &PhoneEvent) {
        self.marked_read.lock().unwrap().push(event.phone.clone());
    }
}

/// Remembers every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<(NotificationKind, String)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.seen().into_iter().map(|(kind, _)| kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, text: &str) {
        self.seen.lock().unwrap().push((kind, text.to_string()));
    }
}
