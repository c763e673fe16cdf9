//! Free-text command grammar of email replies.
//!
//! A reply such as `add "+1 555 1234" to blacklist` or
//! `remove text "spam" from whitelist` becomes a [`RemoteCommand`]:
//!
//! - the list is chosen by the word `blacklist` or `whitelist`
//! - `delete` or `remove` makes it a removal, anything else an addition
//! - `text` targets the text lists, anything else the phone lists
//!
//! Only the reply's own text counts: quoted lines are dropped and reading
//! stops at the first blank line or signature delimiter.

use std::sync::LazyLock;

use regex::Regex;

use super::command::{CommandTarget, RemoteAction, RemoteCommand};
use crate::filter::ListKind;

/// Signature delimiter line (`-- ` with the trailing space trimmed).
const SIGNATURE_DELIMITER: &str = "--";

static QUOTED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).ok());

static NUMBER_RUN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[0-9*-]*[0-9][0-9*-]*").ok());

/// The party named at the end of a notification subject (`... from +1 555 1234`).
static SUBJECT_PARTY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:from|to)\s+(\+?[0-9*(][0-9*() .-]*)$").ok()
});

/// Extracts a command from a reply.
///
/// Returns `None` when the reply names no list. Never fails otherwise; a
/// missing argument yields a command with `argument: None`.
#[must_use]
pub fn parse(subject: &str, body: &str) -> Option<RemoteCommand> {
    let body = reply_text(body);
    let keywords = body.to_lowercase();

    // "blacklist" wins when both appear.
    let list = if keywords.contains("blacklist") {
        ListKind::Blacklist
    } else if keywords.contains("whitelist") {
        ListKind::Whitelist
    } else {
        return None;
    };
    let add = !(keywords.contains("delete") || keywords.contains("remove"));
    let target = if keywords.contains("text") {
        CommandTarget::Text
    } else {
        CommandTarget::Phone
    };

    let argument = match target {
        CommandTarget::Phone => first_quoted(&body)
            .or_else(|| first_quoted(subject))
            .or_else(|| first_number(&body))
            .or_else(|| subject_party(subject))
            .or_else(|| first_number(subject)),
        CommandTarget::Text => first_quoted(&body),
    };

    Some(RemoteCommand::new(
        RemoteAction::new(target, list, add),
        argument,
    ))
}

/// The reply's own first paragraph, line breaks collapsed to spaces.
fn reply_text(body: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();

    for line in body.lines() {
        let line = line.trim();
        if line.starts_with('>') {
            continue;
        }
        if line.is_empty() {
            if kept.is_empty() {
                continue;
            }
            break;
        }
        if line == SIGNATURE_DELIMITER {
            break;
        }
        kept.push(line);
    }

    kept.join(" ")
}

/// Content of the first non-empty `"..."` fragment.
fn first_quoted(text: &str) -> Option<&str> {
    QUOTED
        .as_ref()?
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|fragment| fragment.as_str().trim())
        .find(|fragment| !fragment.is_empty())
}

/// Whole phone number the subject line names, formatting included.
fn subject_party(subject: &str) -> Option<&str> {
    SUBJECT_PARTY
        .as_ref()?
        .captures(subject.trim_end())
        .and_then(|captures| captures.get(1))
        .map(|party| party.as_str().trim())
        .filter(|party| party.chars().any(|c| c.is_ascii_digit()))
}

/// First run of digits, dashes and asterisks that contains a digit.
fn first_number(text: &str) -> Option<&str> {
    NUMBER_RUN.as_ref()?.find(text).map(|run| run.as_str())
}
