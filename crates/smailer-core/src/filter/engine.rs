//! Event classification.

use tracing::trace;

use super::model::{ListMode, PhoneEventFilter};
use super::phone::any_phone_matches;
use crate::event::{PhoneEvent, StateReason};

/// Decides whether an event should be reported.
///
/// 1. A category outside the trigger set yields `TRIGGER_DISABLED` alone.
/// 2. The number is checked against the list selected by the filter mode.
/// 3. SMS text is checked against the text lists.
///
/// Rejections from steps 2 and 3 combine. Pure; safe to call from anywhere.
#[must_use]
pub fn classify(event: &PhoneEvent, filter: &PhoneEventFilter) -> StateReason {
    let category = event.category();
    if !filter.triggers.contains(&category) {
        trace!("{category:?} is not an enabled trigger");
        return StateReason::TRIGGER_DISABLED;
    }

    let mut reason = StateReason::ACCEPTED;

    if !is_phone_accepted(&event.phone, filter) {
        reason.insert(StateReason::REJECTED_BY_BLACKLIST);
    }

    if let Some(text) = event.text.as_deref().filter(|text| !text.is_empty())
        && !is_text_accepted(text, filter)
    {
        reason.insert(StateReason::REJECTED_BY_PATTERN);
    }

    trace!("Classified {category:?} event as {reason}");
    reason
}

fn is_phone_accepted(phone: &str, filter: &PhoneEventFilter) -> bool {
    match filter.mode {
        ListMode::Whitelist => any_phone_matches(&filter.phone_whitelist, phone),
        ListMode::Blacklist => !any_phone_matches(&filter.phone_blacklist, phone),
    }
}

fn is_text_accepted(text: &str, filter: &PhoneEventFilter) -> bool {
    if filter.text_blacklist.iter().any(|p| p.matches(text)) {
        return false;
    }
    filter.text_whitelist.is_empty() || filter.text_whitelist.iter().any(|p| p.matches(text))
}
