//! Filter edits requested by email.

use std::fmt;

use crate::filter::ListKind;

/// Filter field a command edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTarget {
    /// A phone number list.
    Phone,
    /// A message text list.
    Text,
}

/// The closed set of remote filter edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteAction {
    /// Add a number to the phone blacklist.
    AddPhoneToBlacklist,
    /// Remove a number from the phone blacklist.
    RemovePhoneFromBlacklist,
    /// Add a number to the phone whitelist.
    AddPhoneToWhitelist,
    /// Remove a number from the phone whitelist.
    RemovePhoneFromWhitelist,
    /// Add a pattern to the text blacklist.
    AddTextToBlacklist,
    /// Remove a pattern from the text blacklist.
    RemoveTextFromBlacklist,
    /// Add a pattern to the text whitelist.
    AddTextToWhitelist,
    /// Remove a pattern from the text whitelist.
    RemoveTextFromWhitelist,
}

impl RemoteAction {
    /// All actions.
    pub const ALL: [Self; 8] = [
        Self::AddPhoneToBlacklist,
        Self::RemovePhoneFromBlacklist,
        Self::AddPhoneToWhitelist,
        Self::RemovePhoneFromWhitelist,
        Self::AddTextToBlacklist,
        Self::RemoveTextFromBlacklist,
        Self::AddTextToWhitelist,
        Self::RemoveTextFromWhitelist,
    ];

    /// Builds the action from its three choices.
    #[must_use]
    pub const fn new(target: CommandTarget, list: ListKind, add: bool) -> Self {
        match (target, list, add) {
            (CommandTarget::Phone, ListKind::Blacklist, true) => Self::AddPhoneToBlacklist,
            (CommandTarget::Phone, ListKind::Blacklist, false) => Self::RemovePhoneFromBlacklist,
            (CommandTarget::Phone, ListKind::Whitelist, true) => Self::AddPhoneToWhitelist,
            (CommandTarget::Phone, ListKind::Whitelist, false) => Self::RemovePhoneFromWhitelist,
            (CommandTarget::Text, ListKind::Blacklist, true) => Self::AddTextToBlacklist,
            (CommandTarget::Text, ListKind::Blacklist, false) => Self::RemoveTextFromBlacklist,
            (CommandTarget::Text, ListKind::Whitelist, true) => Self::AddTextToWhitelist,
            (CommandTarget::Text, ListKind::Whitelist, false) => Self::RemoveTextFromWhitelist,
        }
    }

    /// Which field the action edits.
    #[must_use]
    pub const fn target(self) -> CommandTarget {
        match self {
            Self::AddPhoneToBlacklist
            | Self::RemovePhoneFromBlacklist
            | Self::AddPhoneToWhitelist
            | Self::RemovePhoneFromWhitelist => CommandTarget::Phone,
            Self::AddTextToBlacklist
            | Self::RemoveTextFromBlacklist
            | Self::AddTextToWhitelist
            | Self::RemoveTextFromWhitelist => CommandTarget::Text,
        }
    }

    /// Which list the action edits.
    #[must_use]
    pub const fn list(self) -> ListKind {
        match self {
            Self::AddPhoneToBlacklist
            | Self::RemovePhoneFromBlacklist
            | Self::AddTextToBlacklist
            | Self::RemoveTextFromBlacklist => ListKind::Blacklist,
            Self::AddPhoneToWhitelist
            | Self::RemovePhoneFromWhitelist
            | Self::AddTextToWhitelist
            | Self::RemoveTextFromWhitelist => ListKind::Whitelist,
        }
    }

    /// Whether the action adds rather than removes.
    #[must_use]
    pub const fn is_add(self) -> bool {
        matches!(
            self,
            Self::AddPhoneToBlacklist
                | Self::AddPhoneToWhitelist
                | Self::AddTextToBlacklist
                | Self::AddTextToWhitelist
        )
    }
}

impl fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.is_add() { "add" } else { "remove" };
        let target = match self.target() {
            CommandTarget::Phone => "phone",
            CommandTarget::Text => "text",
        };
        let preposition = if self.is_add() { "to" } else { "from" };
        write!(f, "{verb} {target} {preposition} {}", self.list().as_str())
    }
}

/// A parsed remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    /// What to do.
    pub action: RemoteAction,
    /// Phone number or text pattern; `None` makes the command a no-op.
    pub argument: Option<String>,
}

impl RemoteCommand {
    /// Creates a command.
    #[must_use]
    pub fn new(action: RemoteAction, argument: Option<&str>) -> Self {
        Self {
            action,
            argument: argument.map(str::to_string),
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(argument) => write!(f, "{} \"{argument}\"", self.action),
            None => write!(f, "{} (no argument)", self.action),
        }
    }
}
