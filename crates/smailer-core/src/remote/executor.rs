//! Applying remote commands to the stored filter.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::command::{CommandTarget, RemoteCommand};
use crate::Result;
use crate::dispatch::same_address;
use crate::filter::{FilterEditor, PhoneEventFilter, TextPattern};
use crate::ports::{FilterStore, NotificationKind, Notifier};

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The filter changed and was saved.
    Applied,
    /// The command would not change the filter.
    Unchanged,
}

/// Applies a command to a filter in memory.
///
/// Returns whether the filter changed. Additions skip entries that are
/// already present and text patterns whose regex does not compile; phone
/// removals drop the entry denoting the number.
pub fn apply(filter: &mut PhoneEventFilter, command: &RemoteCommand) -> bool {
    let Some(argument) = command.argument.as_deref() else {
        return false;
    };
    let list = command.action.list();

    match (command.action.target(), command.action.is_add()) {
        (CommandTarget::Phone, true) => filter.add_phone(list, argument),
        (CommandTarget::Phone, false) => filter.remove_phone(list, argument),
        (CommandTarget::Text, true) => {
            let pattern = TextPattern::from_user_input(argument);
            if let Err(e) = pattern.validate() {
                warn!("Rejecting text pattern {pattern}: {e}");
                return false;
            }
            filter.add_text(list, pattern)
        }
        (CommandTarget::Text, false) => {
            filter.remove_text(list, &TextPattern::from_user_input(argument))
        }
    }
}

/// Whether a message from `from` may control the filter.
#[must_use]
pub fn is_sender_accepted(from: &str, recipients: &[String], restrict: bool) -> bool {
    !restrict || recipients.iter().any(|r| same_address(from, r))
}

/// Executes commands through the shared filter editor.
pub struct RemoteCommandExecutor<S> {
    filters: Arc<FilterEditor<S>>,
    notifier: Arc<dyn Notifier>,
}

impl<S: FilterStore> RemoteCommandExecutor<S> {
    /// Creates an executor.
    #[must_use]
    pub const fn new(filters: Arc<FilterEditor<S>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { filters, notifier }
    }

    /// Applies the command and saves the filter when it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter store fails.
    pub async fn execute(&self, command: &RemoteCommand, notify: bool) -> Result<ExecutionOutcome> {
        if self.filters.update(|filter| apply(filter, command)).await?.is_none() {
            debug!("Remote command made no change: {command}");
            return Ok(ExecutionOutcome::Unchanged);
        }

        info!("Applied remote command: {command}");
        if notify {
            self.notifier
                .notify(NotificationKind::RemoteCommandApplied, &command.to_string());
        }
        Ok(ExecutionOutcome::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::filter::{FilterRepository, ListKind};
    use crate::remote::RemoteAction;
    use crate::testing::RecordingNotifier;

    fn command(action: RemoteAction, argument: &str) -> RemoteCommand {
        RemoteCommand::new(action, Some(argument))
    }

    #[test]
    fn test_add_phone_is_idempotent() {
        let mut filter = PhoneEventFilter::new();
        let add = command(RemoteAction::AddPhoneToBlacklist, "555-1234");

        assert!(apply(&mut filter, &add));
        assert!(!apply(&mut filter, &add));
        assert!(!apply(&mut filter, &command(RemoteAction::AddPhoneToBlacklist, "5551234")));
        assert_eq!(filter.phone_blacklist.len(), 1);
    }

    #[test]
    fn test_remove_phone_uses_fuzzy_match() {
        let mut filter = PhoneEventFilter::new();
        filter.add_phone(ListKind::Whitelist, "5551234567");
        filter.add_phone(ListKind::Whitelist, "9990000");

        assert!(apply(
            &mut filter,
            &command(RemoteAction::RemovePhoneFromWhitelist, "+1 555 123-4567")
        ));
        assert_eq!(filter.phone_whitelist.len(), 1);
        assert!(!apply(
            &mut filter,
            &command(RemoteAction::RemovePhoneFromWhitelist, "1112222")
        ));
    }

    #[test]
    fn test_text_commands_use_exact_entries() {
        let mut filter = PhoneEventFilter::new();

        assert!(apply(&mut filter, &command(RemoteAction::AddTextToBlacklist, "/win.*/")));
        assert!(filter
            .text_blacklist
            .contains(&TextPattern::Regex("win.*".to_string())));

        assert!(!apply(&mut filter, &command(RemoteAction::RemoveTextFromBlacklist, "win.*")));
        assert!(apply(&mut filter, &command(RemoteAction::RemoveTextFromBlacklist, "/win.*/")));
        assert!(filter.text_blacklist.is_empty());
    }

    #[test]
    fn test_broken_regex_is_not_stored() {
        let mut filter = PhoneEventFilter::new();

        assert!(!apply(&mut filter, &command(RemoteAction::AddTextToWhitelist, "/(win/")));
        assert!(filter.text_whitelist.is_empty());

        assert!(apply(&mut filter, &command(RemoteAction::AddTextToWhitelist, "(win")));
        assert!(filter
            .text_whitelist
            .contains(&TextPattern::Literal("(win".to_string())));
    }

    #[test]
    fn test_missing_argument_is_noop() {
        let mut filter = PhoneEventFilter::new();
        let command = RemoteCommand::new(RemoteAction::AddTextToWhitelist, None);
        assert!(!apply(&mut filter, &command));
        assert_eq!(filter, PhoneEventFilter::new());
    }

    #[test]
    fn test_sender_restriction() {
        let recipients = vec!["Me <me@example.com>".to_string()];

        assert!(is_sender_accepted("ME@example.com", &recipients, true));
        assert!(is_sender_accepted("Someone <me@example.com>", &recipients, true));
        assert!(!is_sender_accepted("other@example.com", &recipients, true));
        assert!(is_sender_accepted("other@example.com", &recipients, false));
    }

    #[tokio::test]
    async fn test_execute_saves_and_notifies() {
        let filters = Arc::new(FilterEditor::new(FilterRepository::in_memory().await.unwrap()));
        let notifier = Arc::new(RecordingNotifier::default());
        let executor =
            RemoteCommandExecutor::new(Arc::clone(&filters), Arc::clone(&notifier) as Arc<dyn Notifier>);
        let add = command(RemoteAction::AddPhoneToBlacklist, "5551234");

        assert_eq!(executor.execute(&add, true).await.unwrap(), ExecutionOutcome::Applied);
        assert_eq!(executor.execute(&add, true).await.unwrap(), ExecutionOutcome::Unchanged);

        assert!(filters.current().await.unwrap().phone_blacklist.contains("5551234"));
        assert_eq!(
            notifier.seen(),
            vec![(
                NotificationKind::RemoteCommandApplied,
                "add phone to blacklist \"5551234\"".to_string()
            )]
        );
    }
}
