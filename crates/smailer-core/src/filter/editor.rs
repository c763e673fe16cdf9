//! Serialized read-modify-write access to the stored filter.

use tokio::sync::Mutex;
use tracing::debug;

use super::model::PhoneEventFilter;
use crate::Result;
use crate::ports::FilterStore;

/// The one place the stored filter is changed.
///
/// User edits and remote commands both go through [`FilterEditor::update`],
/// which holds a lock across load, modify and save so concurrent edits
/// cannot overwrite each other.
pub struct FilterEditor<S> {
    store: S,
    lock: Mutex<()>,
}

impl<S: FilterStore> FilterEditor<S> {
    /// Wraps a filter store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// A snapshot of the stored filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn current(&self) -> Result<PhoneEventFilter> {
        self.store.load().await
    }

    /// Applies `edit` to the stored filter and saves the result.
    ///
    /// `edit` returns whether it changed anything; nothing is saved when it
    /// returns `false`. Returns the saved filter, or `None` when unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn update<F>(&self, edit: F) -> Result<Option<PhoneEventFilter>>
    where
        F: FnOnce(&mut PhoneEventFilter) -> bool + Send,
    {
        let _guard = self.lock.lock().await;

        let mut filter = self.store.load().await?;
        if !edit(&mut filter) {
            debug!("Filter edit made no change");
            return Ok(None);
        }

        self.store.save(&filter).await?;
        Ok(Some(filter))
    }

    /// Replaces the stored filter wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn replace(&self, filter: &PhoneEventFilter) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.save(filter).await
    }
}
