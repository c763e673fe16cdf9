//! Filter configuration model.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::phone::{normalize_phone, phone_matches};
use crate::event::Trigger;

/// Which phone list decides whether a number is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// Everything is accepted except blacklisted numbers.
    #[default]
    Blacklist,
    /// Only whitelisted numbers are accepted.
    Whitelist,
}

/// Blacklist or whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Rejecting list.
    Blacklist,
    /// Accepting list.
    Whitelist,
}

impl ListKind {
    /// Lower-case name used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blacklist => "blacklist",
            Self::Whitelist => "whitelist",
        }
    }
}

/// An entry of a text list.
///
/// Stored with an explicit tag, so a literal that looks like a pattern is
/// never mistaken for one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TextPattern {
    /// Matches a message equal to this text.
    Literal(String),
    /// Matches a message the whole of which matches this regular expression.
    Regex(String),
}

impl TextPattern {
    /// Builds an entry from user input: `/expr/` is a regex, anything else a literal.
    #[must_use]
    pub fn from_user_input(input: &str) -> Self {
        match input
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(expr) if !expr.is_empty() => Self::Regex(expr.to_string()),
            _ => Self::Literal(input.to_string()),
        }
    }

    /// Checks that a regex entry compiles.
    ///
    /// # Errors
    ///
    /// Returns the compile error of an invalid regular expression.
    pub fn validate(&self) -> Result<(), regex::Error> {
        match self {
            Self::Literal(_) => Ok(()),
            Self::Regex(expr) => full_match(expr).map(drop),
        }
    }

    /// Whether the message text matches this entry.
    ///
    /// An invalid regular expression matches nothing.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == text,
            Self::Regex(expr) => match full_match(expr) {
                Ok(regex) => regex.is_match(text),
                Err(e) => {
                    warn!("Ignoring invalid text pattern /{expr}/: {e}");
                    false
                }
            },
        }
    }
}

/// Compiles `expr` anchored to the whole text.
fn full_match(expr: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{expr})$"))
}

impl std::fmt::Display for TextPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(literal) => f.write_str(literal),
            Self::Regex(expr) => write!(f, "/{expr}/"),
        }
    }
}

/// Filtering configuration, loaded and saved as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneEventFilter {
    /// Event categories that are reported at all.
    pub triggers: BTreeSet<Trigger>,
    /// Numbers never reported (blacklist mode).
    pub phone_blacklist: BTreeSet<String>,
    /// Only numbers reported (whitelist mode).
    pub phone_whitelist: BTreeSet<String>,
    /// Message texts never reported.
    pub text_blacklist: BTreeSet<TextPattern>,
    /// When non-empty, only message texts reported.
    pub text_whitelist: BTreeSet<TextPattern>,
    /// Which phone list is authoritative.
    pub mode: ListMode,
}

impl Default for PhoneEventFilter {
    fn default() -> Self {
        Self {
            triggers: Trigger::ALL.into_iter().collect(),
            phone_blacklist: BTreeSet::new(),
            phone_whitelist: BTreeSet::new(),
            text_blacklist: BTreeSet::new(),
            text_whitelist: BTreeSet::new(),
            mode: ListMode::Blacklist,
        }
    }
}

impl PhoneEventFilter {
    /// Creates the default filter: every trigger, empty lists, blacklist mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The phone list of the given kind.
    #[must_use]
    pub const fn phone_list(&self, kind: ListKind) -> &BTreeSet<String> {
        match kind {
            ListKind::Blacklist => &self.phone_blacklist,
            ListKind::Whitelist => &self.phone_whitelist,
        }
    }

    /// The text list of the given kind.
    #[must_use]
    pub const fn text_list(&self, kind: ListKind) -> &BTreeSet<TextPattern> {
        match kind {
            ListKind::Blacklist => &self.text_blacklist,
            ListKind::Whitelist => &self.text_whitelist,
        }
    }

    const fn phone_list_mut(&mut self, kind: ListKind) -> &mut BTreeSet<String> {
        match kind {
            ListKind::Blacklist => &mut self.phone_blacklist,
            ListKind::Whitelist => &mut self.phone_whitelist,
        }
    }

    const fn text_list_mut(&mut self, kind: ListKind) -> &mut BTreeSet<TextPattern> {
        match kind {
            ListKind::Blacklist => &mut self.text_blacklist,
            ListKind::Whitelist => &mut self.text_whitelist,
        }
    }

    /// Adds a number to a phone list in normalized form.
    ///
    /// Returns `false` when an entry with the same normalized form already
    /// exists, or when the number normalizes to nothing.
    pub fn add_phone(&mut self, kind: ListKind, number: &str) -> bool {
        let normalized = normalize_phone(number);
        if normalized.is_empty() {
            return false;
        }
        let list = self.phone_list_mut(kind);
        if list.iter().any(|entry| normalize_phone(entry) == normalized) {
            return false;
        }
        list.insert(normalized)
    }

    /// Removes the entry of a phone list that denotes the number.
    ///
    /// An entry with the same normalized form wins. Otherwise the first
    /// plain entry that fuzzy-matches the number is removed. Wildcard
    /// entries are only removed by naming them exactly, and a number
    /// containing `*` never matches by glob here.
    ///
    /// Returns `false` when nothing matched.
    pub fn remove_phone(&mut self, kind: ListKind, number: &str) -> bool {
        let normalized = normalize_phone(number);
        if normalized.is_empty() {
            return false;
        }
        let list = self.phone_list_mut(kind);

        let exact = list
            .iter()
            .find(|entry| normalize_phone(entry) == normalized)
            .cloned();
        let target = exact.or_else(|| {
            if normalized.contains('*') {
                return None;
            }
            list.iter()
                .find(|entry| !entry.contains('*') && phone_matches(entry, &normalized))
                .cloned()
        });

        target.is_some_and(|entry| list.remove(&entry))
    }

    /// Adds an entry to a text list. Returns `false` if already present.
    pub fn add_text(&mut self, kind: ListKind, pattern: TextPattern) -> bool {
        self.text_list_mut(kind).insert(pattern)
    }

    /// Removes an exact entry from a text list. Returns `false` if absent.
    pub fn remove_text(&mut self, kind: ListKind, pattern: &TextPattern) -> bool {
        self.text_list_mut(kind).remove(pattern)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_every_trigger() {
        let filter = PhoneEventFilter::new();
        assert_eq!(filter.triggers.len(), Trigger::ALL.len());
        assert_eq!(filter.mode, ListMode::Blacklist);
    }

    #[test]
    fn test_text_pattern_from_user_input() {
        assert_eq!(
            TextPattern::from_user_input("/spam.*/"),
            TextPattern::Regex("spam.*".to_string())
        );
        assert_eq!(
            TextPattern::from_user_input("//"),
            TextPattern::Literal("//".to_string())
        );
        assert_eq!(
            TextPattern::from_user_input("hello"),
            TextPattern::Literal("hello".to_string())
        );
    }

    #[test]
    fn test_text_pattern_matches() {
        let literal = TextPattern::Literal("spam".to_string());
        assert!(literal.matches("spam"));
        assert!(!literal.matches("more spam"));

        let regex = TextPattern::Regex(".*code: \\d+".to_string());
        assert!(regex.matches("Your code: 1234"));
        assert!(!regex.matches("Your code: 1234!"));

        assert!(!TextPattern::Regex("(".to_string()).matches("("));
    }

    #[test]
    fn test_validate_rejects_broken_regex() {
        assert!(TextPattern::Regex("win.*".to_string()).validate().is_ok());
        assert!(TextPattern::Regex("(".to_string()).validate().is_err());
        assert!(TextPattern::Literal("(".to_string()).validate().is_ok());
    }

    #[test]
    fn test_add_phone_normalizes_and_dedupes() {
        let mut filter = PhoneEventFilter::new();
        assert!(filter.add_phone(ListKind::Blacklist, "555-1234"));
        assert!(!filter.add_phone(ListKind::Blacklist, "555 12 34"));
        assert!(!filter.add_phone(ListKind::Blacklist, "---"));
        assert_eq!(
            filter.phone_blacklist.iter().collect::<Vec<_>>(),
            vec!["5551234"]
        );
    }

    #[test]
    fn test_remove_phone_is_fuzzy() {
        let mut filter = PhoneEventFilter::new();
        filter.add_phone(ListKind::Whitelist, "+1 555 1234");

        assert!(filter.remove_phone(ListKind::Whitelist, "555-1234"));
        assert!(filter.phone_whitelist.is_empty());
        assert!(!filter.remove_phone(ListKind::Whitelist, "555-1234"));
    }

    #[test]
    fn test_remove_phone_keeps_wildcard_rules() {
        let mut filter = PhoneEventFilter::new();
        filter.add_phone(ListKind::Blacklist, "+1555*");
        filter.add_phone(ListKind::Blacklist, "15551234");

        assert!(filter.remove_phone(ListKind::Blacklist, "15551234"));
        assert_eq!(
            filter.phone_blacklist.iter().collect::<Vec<_>>(),
            vec!["1555*"]
        );

        assert!(!filter.remove_phone(ListKind::Blacklist, "15559999"));
        assert!(!filter.remove_phone(ListKind::Blacklist, "*"));
        assert!(filter.remove_phone(ListKind::Blacklist, "1555*"));
        assert!(filter.phone_blacklist.is_empty());
    }

    #[test]
    fn test_remove_phone_prefers_exact_entry() {
        let mut filter = PhoneEventFilter::new();
        filter.add_phone(ListKind::Whitelist, "5551234");
        filter.add_phone(ListKind::Whitelist, "15551234");

        assert!(filter.remove_phone(ListKind::Whitelist, "+1 555 1234"));
        assert_eq!(
            filter.phone_whitelist.iter().collect::<Vec<_>>(),
            vec!["5551234"]
        );
    }

    #[test]
    fn test_serde_keeps_patterns_unambiguous() {
        let mut filter = PhoneEventFilter::new();
        filter.add_text(ListKind::Blacklist, TextPattern::Literal("/x/".to_string()));
        filter.add_text(ListKind::Blacklist, TextPattern::Regex("x".to_string()));

        let json = serde_json::to_string(&filter).unwrap();
        let back: PhoneEventFilter = serde_json::from_str(&json).unwrap();

        assert_eq!(back, filter);
        assert_eq!(back.text_blacklist.len(), 2);
    }
}
