//! Sender account storage using the system keyring.
//!
//! The sender identity is kept in the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager
//!
//! It is removed when the transport reports that the account grant was
//! revoked, so the user is asked to pick a sender again.

use keyring::Entry;
use tracing::{debug, warn};

use crate::ports::SenderAccounts;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "smailer";

/// Credential type identifier for the sender account.
const SENDER_CREDENTIAL: &str = "sender_account";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// The sender address is empty.
    #[error("Sender account must not be empty")]
    EmptySender,
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Sender account stored in the system keyring, one per profile.
#[derive(Debug, Clone)]
pub struct KeyringSenderAccounts {
    key: String,
}

impl KeyringSenderAccounts {
    /// Keyring storage for the given profile name.
    #[must_use]
    pub fn new(profile: &str) -> Self {
        Self {
            key: format!("{SERVICE_NAME}_{SENDER_CREDENTIAL}_{profile}"),
        }
    }

    fn entry(&self) -> CredentialResult<Entry> {
        Ok(Entry::new(SERVICE_NAME, &self.key)?)
    }

    /// Stores the sender address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty or the keyring operation fails.
    pub fn store_sender(&self, address: &str) -> CredentialResult<()> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CredentialError::EmptySender);
        }
        self.entry()?.set_password(address)?;
        debug!("Stored sender account {address}");
        Ok(())
    }
}

impl SenderAccounts for KeyringSenderAccounts {
    fn sender(&self) -> CredentialResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(address) => Ok(Some(address)),
            Err(keyring::Error::NoEntry) => {
                debug!("No sender account stored for {}", self.key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove_sender(&self) -> CredentialResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                debug!("Removed sender account {}", self.key);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No sender account to remove for {}", self.key);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to remove sender account: {e}");
                Err(e.into())
            }
        }
    }
}
