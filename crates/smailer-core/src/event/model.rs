//! Phone event model types.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub i64);

impl EventId {
    /// Create a new event ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a call or message relative to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Received by the device.
    #[default]
    Incoming,
    /// Initiated by the device.
    Outgoing,
}

impl Direction {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "outgoing" => Self::Outgoing,
            _ => Self::Incoming,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

/// Event category used by the filter's trigger set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// SMS received.
    IncomingSms,
    /// SMS sent.
    OutgoingSms,
    /// Answered incoming call.
    IncomingCall,
    /// Outgoing call.
    OutgoingCall,
    /// Incoming call that was not answered.
    MissedCall,
}

impl Trigger {
    /// Every trigger, in display order.
    pub const ALL: [Self; 5] = [
        Self::IncomingSms,
        Self::OutgoingSms,
        Self::IncomingCall,
        Self::OutgoingCall,
        Self::MissedCall,
    ];

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::IncomingSms => "Incoming SMS",
            Self::OutgoingSms => "Outgoing SMS",
            Self::IncomingCall => "Incoming call",
            Self::OutgoingCall => "Outgoing call",
            Self::MissedCall => "Missed call",
        }
    }
}

/// A geographic position attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoCoordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Delivery state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    /// Accepted and waiting for a successful email.
    #[default]
    Pending,
    /// Emailed successfully.
    Processed,
    /// Rejected by the filter, never emailed.
    Ignored,
}

impl EventState {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "processed" => Self::Processed,
            "ignored" => Self::Ignored,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Ignored => "ignored",
        }
    }

    /// Whether no further transition can leave this state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Ignored)
    }
}

impl std::fmt::Display for EventState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an event is in its current state.
///
/// The empty mask means accepted; any set bit is a rejection reason, so
/// "accepted" can never combine with a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateReason(u32);

impl StateReason {
    /// No rejection reason.
    pub const ACCEPTED: Self = Self(0);
    /// The event's category is not an enabled trigger.
    pub const TRIGGER_DISABLED: Self = Self(1);
    /// The phone number was rejected by the phone lists.
    pub const REJECTED_BY_BLACKLIST: Self = Self(1 << 1);
    /// The SMS text was rejected by the text lists.
    pub const REJECTED_BY_PATTERN: Self = Self(1 << 2);

    const NAMES: [(Self, &'static str); 3] = [
        (Self::TRIGGER_DISABLED, "trigger-disabled"),
        (Self::REJECTED_BY_BLACKLIST, "rejected-by-blacklist"),
        (Self::REJECTED_BY_PATTERN, "rejected-by-pattern"),
    ];

    /// Raw bits, as stored.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Rebuilds a reason from stored bits, dropping unknown ones.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & 0b111)
    }

    /// True when no rejection reason is set.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// Adds the bits of `other`.
    pub const fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for StateReason {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for StateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_accepted() {
            return f.write_str("accepted");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// A single observed call or SMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneEvent {
    /// Store identifier (None until first persisted).
    pub id: Option<EventId>,
    /// Phone number of the other party, possibly masked.
    pub phone: String,
    /// Direction of the call or message.
    pub direction: Direction,
    /// Whether the call went unanswered.
    pub missed: bool,
    /// Start time, epoch milliseconds.
    pub start_time: i64,
    /// End time, epoch milliseconds (absent for missed calls).
    pub end_time: Option<i64>,
    /// Message text; present only for SMS.
    pub text: Option<String>,
    /// Device location when the event happened.
    pub location: Option<GeoCoordinates>,
    /// Delivery state.
    pub state: EventState,
    /// Reason for the current state.
    pub state_reason: StateReason,
    /// Whether the user has seen this event in the history.
    pub read: bool,
}

impl PhoneEvent {
    fn base(phone: &str, direction: Direction, start_time: i64) -> Self {
        Self {
            id: None,
            phone: phone.to_string(),
            direction,
            missed: false,
            start_time,
            end_time: None,
            text: None,
            location: None,
            state: EventState::Pending,
            state_reason: StateReason::ACCEPTED,
            read: false,
        }
    }

    /// Creates a received SMS event.
    #[must_use]
    pub fn incoming_sms(phone: &str, text: &str, received_at: i64) -> Self {
        Self {
            text: Some(text.to_string()),
            end_time: Some(received_at),
            ..Self::base(phone, Direction::Incoming, received_at)
        }
    }

    /// Creates a sent SMS event.
    #[must_use]
    pub fn outgoing_sms(phone: &str, text: &str, sent_at: i64) -> Self {
        Self {
            text: Some(text.to_string()),
            end_time: Some(sent_at),
            ..Self::base(phone, Direction::Outgoing, sent_at)
        }
    }

    /// Creates a completed call event.
    #[must_use]
    pub fn call(phone: &str, direction: Direction, start_time: i64, end_time: i64) -> Self {
        Self {
            end_time: Some(end_time),
            ..Self::base(phone, direction, start_time)
        }
    }

    /// Creates a missed incoming call event.
    #[must_use]
    pub fn missed_call(phone: &str, rang_at: i64) -> Self {
        Self {
            missed: true,
            ..Self::base(phone, Direction::Incoming, rang_at)
        }
    }

    /// True iff the event carries non-empty SMS text.
    #[must_use]
    pub fn is_sms(&self) -> bool {
        self.text.as_deref().is_some_and(|text| !text.is_empty())
    }

    /// Trigger category derived from direction, kind and missed flag.
    #[must_use]
    pub fn category(&self) -> Trigger {
        match (self.is_sms(), self.direction, self.missed) {
            (true, Direction::Incoming, _) => Trigger::IncomingSms,
            (true, Direction::Outgoing, _) => Trigger::OutgoingSms,
            (false, _, true) => Trigger::MissedCall,
            (false, Direction::Incoming, false) => Trigger::IncomingCall,
            (false, Direction::Outgoing, false) => Trigger::OutgoingCall,
        }
    }

    /// Call duration, when both ends are known.
    #[must_use]
    pub fn call_duration(&self) -> Option<TimeDelta> {
        self.end_time
            .filter(|end| *end >= self.start_time)
            .map(|end| TimeDelta::milliseconds(end - self.start_time))
    }

    /// Start time as a UTC timestamp.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_time)
    }
}
