//! Inbox polling for remote commands.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::executor::{ExecutionOutcome, RemoteCommandExecutor, is_sender_accepted};
use super::parser::parse;
use crate::Result;
use crate::ports::{FilterStore, InboxMessage, MailTransport};
use crate::settings::{RemoteControlSettings, SharedSettings};

/// Subject prefix marking a message as a reply.
const REPLY_PREFIX: &str = "re:";

/// Counts from one inbox poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Messages returned by the inbox query.
    pub fetched: usize,
    /// Messages that are not replies, left untouched in the inbox.
    pub not_replies: usize,
    /// Commands that changed the filter.
    pub applied: usize,
    /// Commands that left the filter as it was.
    pub unchanged: usize,
    /// Messages with no recognizable command.
    pub unparsed: usize,
    /// Messages from senders that may not control the filter.
    pub rejected: usize,
    /// Messages whose mark-read or trash call failed.
    pub cleanup_failures: usize,
}

/// Reads command replies from the sender account's inbox and applies them.
pub struct RemoteControlProcessor<T, S> {
    transport: Arc<T>,
    executor: RemoteCommandExecutor<S>,
    settings: SharedSettings,
}

impl<T: MailTransport, S: FilterStore> RemoteControlProcessor<T, S> {
    /// Creates a processor.
    #[must_use]
    pub const fn new(
        transport: Arc<T>,
        executor: RemoteCommandExecutor<S>,
        settings: SharedSettings,
    ) -> Self {
        Self {
            transport,
            executor,
            settings,
        }
    }

    /// Handles every matching inbox reply once.
    ///
    /// Only replies carry commands; other messages (such as our own
    /// notifications when the sender is also a recipient) are skipped and
    /// left unread. Handled replies are marked read, and trashed when
    /// configured, whether or not they carried a usable command.
    ///
    /// # Errors
    ///
    /// Returns an error if the inbox cannot be listed or the filter store fails.
    pub async fn poll(&self) -> Result<PollSummary> {
        let settings = self.settings.read().await.clone();
        let mut summary = PollSummary::default();

        if !settings.remote_control.enabled {
            debug!("Remote control disabled, not polling");
            return Ok(summary);
        }

        let messages = self
            .transport
            .list_inbox(&settings.remote_control.inbox_query)
            .await?;
        summary.fetched = messages.len();

        for message in &messages {
            if !is_reply(&message.subject) {
                debug!("Message {} is not a reply, skipping", message.id);
                summary.not_replies += 1;
                continue;
            }

            if !is_sender_accepted(
                &message.from,
                &settings.recipients,
                settings.remote_control.restrict_to_recipients,
            ) {
                warn!("Ignoring command mail from unknown sender {}", message.from);
                summary.rejected += 1;
            } else if let Some(command) = parse(&message.subject, &message.body) {
                match self
                    .executor
                    .execute(&command, settings.remote_control.notify_on_change)
                    .await?
                {
                    ExecutionOutcome::Applied => summary.applied += 1,
                    ExecutionOutcome::Unchanged => summary.unchanged += 1,
                }
            } else {
                debug!("No command in message {}", message.id);
                summary.unparsed += 1;
            }

            if !self.clean_up(message, &settings.remote_control).await {
                summary.cleanup_failures += 1;
            }
        }

        if summary.fetched > 0 {
            info!("Remote control poll: {summary:?}");
        }
        Ok(summary)
    }

    async fn clean_up(&self, message: &InboxMessage, settings: &RemoteControlSettings) -> bool {
        if let Err(e) = self.transport.mark_read(&message.id).await {
            warn!("Failed to mark message {} read: {e}", message.id);
            return false;
        }
        if settings.trash_processed
            && let Err(e) = self.transport.trash(&message.id).await
        {
            warn!("Failed to trash message {}: {e}", message.id);
            return false;
        }
        true
    }
}

/// Whether a subject marks its message as a reply.
fn is_reply(subject: &str) -> bool {
    subject
        .trim_start()
        .get(..REPLY_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(REPLY_PREFIX))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::filter::{FilterEditor, FilterRepository, ListKind, PhoneEventFilter, TextPattern};
    use crate::ports::{Notifier, TransportError};
    use crate::settings::Settings;
    use crate::testing::{FakeTransport, RecordingNotifier};

    struct Fixture {
        transport: Arc<FakeTransport>,
        filters: Arc<FilterEditor<FilterRepository>>,
        processor: RemoteControlProcessor<FakeTransport, FilterRepository>,
    }

    async fn fixture(settings: Settings) -> Fixture {
        let transport = Arc::new(FakeTransport::new());
        let filters = Arc::new(FilterEditor::new(FilterRepository::in_memory().await.unwrap()));
        let executor = RemoteCommandExecutor::new(
            Arc::clone(&filters),
            Arc::new(RecordingNotifier::default()) as Arc<dyn Notifier>,
        );
        let processor =
            RemoteControlProcessor::new(Arc::clone(&transport), executor, settings.shared());
        Fixture {
            transport,
            filters,
            processor,
        }
    }

    fn enabled() -> Settings {
        let mut settings = Settings {
            recipients: vec!["me@example.com".to_string()],
            ..Settings::default()
        };
        settings.remote_control.enabled = true;
        settings
    }

    fn reply(id: &str, from: &str, body: &str) -> InboxMessage {
        InboxMessage {
            id: id.to_string(),
            from: from.to_string(),
            subject: "Re: [SMailer] Incoming SMS from 5551234".to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_disabled_does_not_poll() {
        let f = fixture(Settings::default()).await;
        f.transport.deliver_to_inbox(reply("1", "me@example.com", "add to blacklist"));

        assert_eq!(f.processor.poll().await.unwrap(), PollSummary::default());
        assert!(f.transport.read().is_empty());
    }

    #[tokio::test]
    async fn test_commands_are_applied_and_cleaned_up() {
        let f = fixture(enabled()).await;
        f.transport.deliver_to_inbox(reply("1", "Me <ME@example.com>", "add to blacklist"));
        f.transport.deliver_to_inbox(reply("2", "me@example.com", "add text \"spam\" to blacklist"));
        f.transport.deliver_to_inbox(reply("3", "me@example.com", "thanks"));

        let summary = f.processor.poll().await.unwrap();

        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.unparsed, 1);
        let filter = f.filters.current().await.unwrap();
        assert!(filter.phone_blacklist.contains("5551234"));
        assert!(filter
            .text_list(ListKind::Blacklist)
            .contains(&TextPattern::Literal("spam".to_string())));
        assert_eq!(f.transport.read(), vec!["1", "2", "3"]);
        assert_eq!(f.transport.trashed(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_unknown_sender_is_rejected_but_marked_read() {
        let mut settings = enabled();
        settings.remote_control.trash_processed = false;
        let f = fixture(settings).await;
        f.transport.deliver_to_inbox(reply("1", "stranger@example.com", "add to blacklist"));

        let summary = f.processor.poll().await.unwrap();

        assert_eq!(summary.rejected, 1);
        assert_eq!(f.filters.current().await.unwrap(), PhoneEventFilter::new());
        assert_eq!(f.transport.read(), vec!["1"]);
        assert!(f.transport.trashed().is_empty());
    }

    #[test]
    fn test_is_reply() {
        assert!(is_reply("Re: [SMailer] Missed call from 555"));
        assert!(is_reply("  RE:[SMailer] Missed call from 555"));
        assert!(!is_reply("[SMailer] Missed call from 555"));
        assert!(!is_reply("Fwd: Re: hello"));
        assert!(!is_reply("R"));
    }

    #[tokio::test]
    async fn test_own_notification_is_left_alone() {
        let mut settings = enabled();
        settings.recipients = vec!["phone@example.com".to_string()];
        let f = fixture(settings).await;
        let mut before = PhoneEventFilter::new();
        before.add_phone(ListKind::Whitelist, "7770000");
        f.filters.replace(&before).await.unwrap();
        f.transport.deliver_to_inbox(InboxMessage {
            id: "n1".to_string(),
            from: "phone@example.com".to_string(),
            subject: "[SMailer] Incoming SMS from 5551234".to_string(),
            body: "remove \"*\" from whitelist\n\n---\nSender: 5551234".to_string(),
        });

        let summary = f.processor.poll().await.unwrap();

        assert_eq!(summary.fetched, 1);
        assert_eq!(summary.not_replies, 1);
        assert_eq!(summary.applied, 0);
        assert_eq!(f.filters.current().await.unwrap(), before);
        assert!(f.transport.read().is_empty());
        assert!(f.transport.trashed().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_poll() {
        let f = fixture(enabled()).await;
        f.transport
            .fail_listing(TransportError::Connection("offline".to_string()));

        assert!(f.processor.poll().await.is_err());
    }
}
