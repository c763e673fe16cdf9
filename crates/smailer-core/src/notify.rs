//! User notification sinks.

use notify_rust::Notification;
use tracing::{info, warn};

use crate::ports::{NotificationKind, Notifier};

/// Application name shown by the desktop notification daemon.
const APP_NAME: &str = "SMailer";

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, text: &str) {
        match kind {
            NotificationKind::MailSent | NotificationKind::RemoteCommandApplied => {
                info!("{}: {text}", kind.title());
            }
            NotificationKind::ConfigurationError
            | NotificationKind::AuthorizationError
            | NotificationKind::ResendFailed => warn!("{}: {text}", kind.title()),
        }
    }
}

/// Shows notifications on the desktop.
///
/// A notification that cannot be shown is logged and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, kind: NotificationKind, text: &str) {
        let result = Notification::new()
            .appname(APP_NAME)
            .summary(kind.title())
            .body(text)
            .show();

        if let Err(e) = result {
            warn!("Failed to show notification '{}': {e}", kind.title());
        }
    }
}
