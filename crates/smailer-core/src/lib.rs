//! # smailer-core
//!
//! Core logic of `SMailer`, which emails phone activity (calls and SMS) from
//! a device and takes filter edits back by email reply.
//!
//! This crate provides:
//! - Event classification against a configurable filter
//! - Event state tracking and `SQLite` storage
//! - Mail composition and dispatch through a pluggable transport
//! - Resend passes for events that could not be sent
//! - **Remote Control** - filter commands parsed from email replies
//!
//! Mail transport, device access and notifications are ports (see
//! [`ports`]); hosts provide implementations and wire the services
//! together:
//!
//! ```text
//! captured event ─▶ EventProcessor ─▶ classify ─▶ EventStore
//!                                        │
//!                                        └─ pending ─▶ Delivery ─▶ MailTransport
//! ResendCoordinator ─▶ Delivery
//! RemoteControlProcessor ─▶ parse ─▶ RemoteCommandExecutor ─▶ FilterEditor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod credentials;
pub mod delivery;
pub mod dispatch;
mod error;
pub mod event;
pub mod filter;
pub mod logging;
pub mod notify;
pub mod ports;
pub mod processor;
pub mod remote;
pub mod resend;
pub mod settings;
pub mod time;

#[cfg(test)]
mod testing;

pub use credentials::{CredentialError, CredentialResult, KeyringSenderAccounts};
pub use delivery::{Delivery, DeliveryOutcome};
pub use dispatch::{DispatchError, DispatchErrorKind, MailDispatcher, OutgoingMail};
pub use error::{Error, Result};
pub use event::{EventId, EventRepository, EventState, PhoneEvent, StateReason, Trigger};
pub use filter::{FilterEditor, FilterRepository, ListKind, ListMode, PhoneEventFilter, classify};
pub use notify::{DesktopNotifier, TracingNotifier};
pub use processor::{EventProcessor, ProcessOutcome};
pub use remote::{RemoteAction, RemoteCommand, RemoteCommandExecutor, RemoteControlProcessor};
pub use resend::{PassOutcome, PassSummary, ResendCoordinator, ResendTrigger};
pub use settings::{Settings, SharedSettings};
