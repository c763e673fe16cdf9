//! Delivery of one pending event: dispatch plus its state change and side effects.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::Result;
use crate::dispatch::{DispatchError, DispatchErrorKind, MailDispatcher, format_subject};
use crate::event::{Direction, EventId, EventState, after_delivery};
use crate::ports::{Device, EventStore, MailTransport, NotificationKind, Notifier, SenderAccounts};
use crate::settings::SharedSettings;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The email went out and the event is now processed.
    Sent,
    /// The event was missing or no longer pending; nothing was sent.
    Skipped,
    /// The email was not sent; the event stays pending.
    Failed(DispatchError),
}

/// Emails pending events one at a time.
///
/// All sends, whether for a fresh event or a resend pass, go through one
/// lock, and the event is reloaded after acquiring it. An event processed
/// by a concurrent caller is therefore skipped instead of sent twice.
pub struct Delivery<T, E> {
    dispatcher: MailDispatcher<T>,
    events: Arc<E>,
    device: Arc<dyn Device>,
    notifier: Arc<dyn Notifier>,
    settings: SharedSettings,
    lock: Mutex<()>,
}

impl<T: MailTransport, E: EventStore> Delivery<T, E> {
    /// Creates the delivery service.
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        events: Arc<E>,
        accounts: Arc<dyn SenderAccounts>,
        device: Arc<dyn Device>,
        notifier: Arc<dyn Notifier>,
        settings: SharedSettings,
    ) -> Self {
        Self {
            dispatcher: MailDispatcher::new(transport, accounts, Arc::clone(&device)),
            events,
            device,
            notifier,
            settings,
            lock: Mutex::new(()),
        }
    }

    /// The event store.
    #[must_use]
    pub const fn events(&self) -> &Arc<E> {
        &self.events
    }

    /// The shared settings.
    #[must_use]
    pub const fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// The notifier.
    #[must_use]
    pub const fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// The device port.
    #[must_use]
    pub const fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// Emails the event with the given id if it is still pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the event store fails. Mail failures are reported
    /// as [`DeliveryOutcome::Failed`].
    pub async fn deliver(&self, id: EventId) -> Result<DeliveryOutcome> {
        let _guard = self.lock.lock().await;

        let Some(event) = self.events.get(id).await? else {
            warn!("Event {id} vanished before delivery");
            return Ok(DeliveryOutcome::Skipped);
        };
        if event.state != EventState::Pending {
            debug!("Event {id} is {}, not sending", event.state);
            return Ok(DeliveryOutcome::Skipped);
        }

        let settings = self.settings.read().await.clone();

        match self.dispatcher.dispatch(&event, &settings).await {
            Ok(()) => {
                let next = after_delivery(event.state, true)?;
                self.events.update_state(id, next).await?;
                info!("Event {id} emailed");

                if settings.notifications.on_success {
                    self.notifier
                        .notify(NotificationKind::MailSent, &format_subject(&event));
                }
                if settings.mark_sms_read && event.is_sms() && event.direction == Direction::Incoming {
                    self.device.mark_sms_read(&event);
                }
                Ok(DeliveryOutcome::Sent)
            }
            Err(e) => {
                // A failed attempt leaves the event pending for the next resend pass.
                after_delivery(event.state, false)?;
                warn!("Event {id} not emailed: {e}");

                if settings.notifications.on_error {
                    match e.kind() {
                        DispatchErrorKind::Configuration => self
                            .notifier
                            .notify(NotificationKind::ConfigurationError, &e.to_string()),
                        DispatchErrorKind::Authorization => self
                            .notifier
                            .notify(NotificationKind::AuthorizationError, &e.to_string()),
                        DispatchErrorKind::Transient => {}
                    }
                }
                Ok(DeliveryOutcome::Failed(e))
            }
        }
    }
}
