//! Entry point for freshly captured phone events.

use std::sync::Arc;

use tracing::{debug, info};

use crate::Result;
use crate::delivery::{Delivery, DeliveryOutcome};
use crate::event::{EventId, EventState, PhoneEvent, StateReason};
use crate::filter::{FilterEditor, classify};
use crate::ports::{EventStore, FilterStore, MailTransport};

/// What happened to a captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The filter rejected the event; it was stored as ignored.
    Ignored {
        /// Stored event id.
        id: EventId,
        /// Every rule that rejected it.
        reason: StateReason,
    },
    /// The event was accepted and a delivery was attempted.
    Delivered {
        /// Stored event id.
        id: EventId,
        /// Result of the attempt.
        outcome: DeliveryOutcome,
    },
}

impl ProcessOutcome {
    /// Stored event id.
    #[must_use]
    pub const fn id(&self) -> EventId {
        match self {
            Self::Ignored { id, .. } | Self::Delivered { id, .. } => *id,
        }
    }
}

/// Classifies, stores and delivers captured events.
pub struct EventProcessor<T, E, S> {
    delivery: Arc<Delivery<T, E>>,
    filters: Arc<FilterEditor<S>>,
}

impl<T: MailTransport, E: EventStore, S: FilterStore> EventProcessor<T, E, S> {
    /// Creates a processor sharing the delivery service and filter editor.
    #[must_use]
    pub const fn new(delivery: Arc<Delivery<T, E>>, filters: Arc<FilterEditor<S>>) -> Self {
        Self { delivery, filters }
    }

    /// Handles one captured event.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter or event store fails.
    pub async fn process(&self, mut event: PhoneEvent) -> Result<ProcessOutcome> {
        if event.location.is_none() {
            event.location = self.delivery.device().last_known_location();
        }

        let filter = self.filters.current().await?;
        event.apply_classification(classify(&event, &filter));

        let id = self.delivery.events().put(&event).await?;
        debug!(
            "Stored {} event {id} as {} ({})",
            event.category().display_name(),
            event.state,
            event.state_reason
        );

        if event.state != EventState::Pending {
            info!("Event {id} ignored: {}", event.state_reason);
            return Ok(ProcessOutcome::Ignored {
                id,
                reason: event.state_reason,
            });
        }

        let outcome = self.delivery.deliver(id).await?;
        Ok(ProcessOutcome::Delivered { id, outcome })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::{EventRepository, GeoCoordinates};
    use crate::filter::{FilterRepository, ListKind};
    use crate::ports::{Device, Notifier};
    use crate::settings::Settings;
    use crate::testing::{FakeDevice, FakeTransport, RecordingNotifier, StaticAccounts};

    type Processor = EventProcessor<FakeTransport, EventRepository, FilterRepository>;

    async fn processor(transport: &Arc<FakeTransport>) -> Processor {
        let device = FakeDevice::new("Pixel").with_location(GeoCoordinates::new(1.0, 2.0));
        let delivery = Delivery::new(
            Arc::clone(transport),
            Arc::new(EventRepository::in_memory().await.unwrap()),
            Arc::new(StaticAccounts::new(Some("phone@example.com"))),
            Arc::new(device) as Arc<dyn Device>,
            Arc::new(RecordingNotifier::default()) as Arc<dyn Notifier>,
            Settings {
                recipients: vec!["me@example.com".to_string()],
                ..Settings::default()
            }
            .shared(),
        );
        let filters = FilterEditor::new(FilterRepository::in_memory().await.unwrap());
        EventProcessor::new(Arc::new(delivery), Arc::new(filters))
    }

    #[tokio::test]
    async fn test_accepted_event_is_sent_and_processed() {
        let transport = Arc::new(FakeTransport::new());
        let processor = processor(&transport).await;

        let outcome = processor
            .process(PhoneEvent::incoming_sms("5551234", "hello", 0))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            ProcessOutcome::Delivered {
                outcome: DeliveryOutcome::Sent,
                ..
            }
        ));
        let stored = processor
            .delivery
            .events()
            .get(outcome.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state, EventState::Processed);
        assert_eq!(stored.location, Some(GeoCoordinates::new(1.0, 2.0)));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_event_is_stored_ignored() {
        let transport = Arc::new(FakeTransport::new());
        let processor = processor(&transport).await;
        processor
            .filters
            .update(|f| f.add_phone(ListKind::Blacklist, "555-1234"))
            .await
            .unwrap();

        let outcome = processor
            .process(PhoneEvent::missed_call("5551234", 0))
            .await
            .unwrap();

        let ProcessOutcome::Ignored { id, reason } = outcome else {
            panic!("expected an ignored outcome");
        };
        assert_eq!(reason, StateReason::REJECTED_BY_BLACKLIST);

        let stored = processor.delivery.events().get(id).await.unwrap().unwrap();
        assert_eq!(stored.state, EventState::Ignored);
        assert_eq!(stored.state_reason, reason);
        assert!(transport.sent().is_empty());
    }
}
