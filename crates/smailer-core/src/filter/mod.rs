//! Event filtering: which captured events are worth an email.
//!
//! - **Triggers** select the event categories that are reported at all
//! - **Phone lists** accept or reject numbers; the list mode decides which
//!   list is authoritative
//! - **Text lists** accept or reject SMS bodies by literal or regex
//!
//! [`classify`] is pure. Changes to the stored filter go through
//! [`FilterEditor`] so edits from the user and from remote commands are
//! serialized.

mod editor;
mod engine;
mod model;
mod phone;
mod repository;

pub use editor::FilterEditor;
pub use engine::classify;
pub use model::{ListKind, ListMode, PhoneEventFilter, TextPattern};
pub use phone::{MIN_SUFFIX_MATCH_LEN, normalize_phone, phone_matches};
pub use repository::FilterRepository;
