//! Remote control of the filter by email reply.
//!
//! Replies to notification mails land in the sender account's inbox.
//! [`RemoteControlProcessor::poll`] picks them up, [`parse`] turns the
//! reply text into a [`RemoteCommand`], and [`RemoteCommandExecutor`]
//! applies it through the shared filter editor.

mod command;
mod executor;
mod parser;
mod processor;

pub use command::{CommandTarget, RemoteAction, RemoteCommand};
pub use executor::{ExecutionOutcome, RemoteCommandExecutor, apply, is_sender_accepted};
pub use parser::parse;
pub use processor::{PollSummary, RemoteControlProcessor};
