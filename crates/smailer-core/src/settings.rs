//! Application settings persisted as a JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Result;

/// Settings shared between services. Readers take a snapshot per operation.
pub type SharedSettings = Arc<RwLock<Settings>>;

/// Directory name under the platform config/data directories.
const APP_DIR: &str = "smailer";

/// Inbox query used to find replies to our own notifications.
pub const DEFAULT_INBOX_QUERY: &str = "in:inbox is:unread subject:\"Re: [SMailer]\"";

/// Which optional lines appear in the mail footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ContentOptions {
    /// Contact name and number of the other party.
    pub caller: bool,
    /// Name of the device that saw the event.
    pub device_name: bool,
    /// Time the event happened.
    pub event_time: bool,
    /// Map link to the device location.
    pub location: bool,
    /// `mailto:` links that reply with filter commands.
    pub remote_control_links: bool,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            caller: true,
            device_name: true,
            event_time: true,
            location: true,
            remote_control_links: false,
        }
    }
}

/// Handling of inbound replies carrying filter commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RemoteControlSettings {
    /// Whether the inbox is polled at all.
    pub enabled: bool,
    /// Only accept commands from configured recipients.
    pub restrict_to_recipients: bool,
    /// Notify the user when a command changes the filter.
    pub notify_on_change: bool,
    /// Move handled messages to trash after marking them read.
    pub trash_processed: bool,
    /// Transport query selecting candidate messages.
    pub inbox_query: String,
}

impl Default for RemoteControlSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            restrict_to_recipients: true,
            notify_on_change: true,
            trash_processed: true,
            inbox_query: DEFAULT_INBOX_QUERY.to_string(),
        }
    }
}

/// Which delivery outcomes produce a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Notify after every successful email.
    pub on_success: bool,
    /// Notify on configuration and authorization errors.
    pub on_error: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            on_success: false,
            on_error: true,
        }
    }
}

/// Application settings that persist across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Addresses that receive event emails.
    pub recipients: Vec<String>,
    /// Mail footer content.
    pub content: ContentOptions,
    /// Remote control by email reply.
    pub remote_control: RemoteControlSettings,
    /// User notifications.
    pub notifications: NotificationSettings,
    /// Mark an SMS read on the device once it was emailed.
    pub mark_sms_read: bool,
    /// Minimum time between timer-driven resend passes.
    pub resend_min_interval_secs: u64,
    /// Upper bound for one transport call.
    pub send_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            content: ContentOptions::default(),
            remote_control: RemoteControlSettings::default(),
            notifications: NotificationSettings::default(),
            mark_sms_read: false,
            resend_min_interval_secs: 300,
            send_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Wraps the settings for sharing between services.
    #[must_use]
    pub fn shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }

    /// Minimum time between timer-driven resend passes.
    #[must_use]
    pub const fn resend_min_interval(&self) -> Duration {
        Duration::from_secs(self.resend_min_interval_secs)
    }

    /// Upper bound for one transport call.
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Default settings file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("settings.json")
    }

    /// Default database location for the event and filter stores.
    #[must_use]
    pub fn default_database_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("smailer.db")
    }

    /// Load settings from a file; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to a file, creating parent directories.
    ///
    /// The document is written to a sibling temporary file and renamed over
    /// `path`, so readers see either the old or the new settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        let temp_path = temporary_path(path);
        tokio::fs::write(&temp_path, contents).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        info!("Settings saved to {}", path.display());
        Ok(())
    }
}

/// `settings.json` -> `settings.json.tmp`, in the same directory.
fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
