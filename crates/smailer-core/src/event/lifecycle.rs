//! Event state machine.
//!
//! ```text
//!   classify == accepted ──▶ PENDING ──delivered──▶ PROCESSED
//!   classify != accepted ──▶ IGNORED      │
//!                               ▲         └─failed─▶ PENDING
//! ```
//!
//! PROCESSED and IGNORED are terminal.

use super::model::{EventState, PhoneEvent, StateReason};
use crate::{Error, Result};

/// Initial state for a freshly classified event.
#[must_use]
pub const fn initial_state(reason: StateReason) -> EventState {
    if reason.is_accepted() {
        EventState::Pending
    } else {
        EventState::Ignored
    }
}

/// State after a delivery attempt.
///
/// # Errors
///
/// Returns [`Error::InvalidTransition`] when `current` is terminal.
pub fn after_delivery(current: EventState, delivered: bool) -> Result<EventState> {
    let next = if delivered {
        EventState::Processed
    } else {
        EventState::Pending
    };
    if current.is_terminal() {
        return Err(Error::InvalidTransition {
            from: current,
            to: next,
        });
    }
    Ok(next)
}

impl PhoneEvent {
    /// Records the filter decision on the event.
    pub const fn apply_classification(&mut self, reason: StateReason) {
        self.state_reason = reason;
        self.state = initial_state(reason);
    }

    /// Records the result of a delivery attempt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] when the event is already terminal;
    /// the event is left untouched.
    pub fn apply_delivery(&mut self, delivered: bool) -> Result<()> {
        self.state = after_delivery(self.state, delivered)?;
        Ok(())
    }
}
