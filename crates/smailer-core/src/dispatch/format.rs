//! Subject and body text of event emails.

use std::fmt::Write;

use chrono::{FixedOffset, Local, TimeDelta};

use crate::event::{PhoneEvent, Trigger};
use crate::settings::ContentOptions;

/// Prefix of every notification subject; replies are found by it.
pub const SUBJECT_PREFIX: &str = "[SMailer]";

/// Separator between the message and the footer.
const FOOTER_SEPARATOR: &str = "---";

/// Values the footer needs besides the event itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailContext {
    /// Name of this device.
    pub device_name: String,
    /// Contact name of the other party, when known.
    pub contact_name: Option<String>,
    /// Address remote control links reply to.
    pub reply_address: Option<String>,
    /// Zone event times are shown in.
    pub time_zone: FixedOffset,
}

impl MailContext {
    /// Context in the local time zone with no contact or reply address.
    #[must_use]
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            contact_name: None,
            reply_address: None,
            time_zone: *Local::now().offset(),
        }
    }
}

/// Subject line for an event.
#[must_use]
pub fn format_subject(event: &PhoneEvent) -> String {
    let preposition = match event.category() {
        Trigger::OutgoingSms | Trigger::OutgoingCall => "to",
        Trigger::IncomingSms | Trigger::IncomingCall | Trigger::MissedCall => "from",
    };
    format!(
        "{SUBJECT_PREFIX} {} {preposition} {}",
        event.category().display_name(),
        event.phone
    )
}

/// Body text for an event: the message, then the enabled footer lines.
#[must_use]
pub fn format_body(event: &PhoneEvent, options: &ContentOptions, context: &MailContext) -> String {
    let mut body = message_text(event);

    let footer = footer_lines(event, options, context);
    if !footer.is_empty() {
        let _ = write!(body, "\n\n{FOOTER_SEPARATOR}\n{}", footer.join("\n"));
    }

    body
}

fn message_text(event: &PhoneEvent) -> String {
    let duration = || {
        event
            .call_duration()
            .map_or_else(|| "unknown".to_string(), format_duration)
    };

    match event.category() {
        Trigger::IncomingSms | Trigger::OutgoingSms => event.text.clone().unwrap_or_default(),
        Trigger::IncomingCall => {
            format!("You had an incoming call of {} duration.", duration())
        }
        Trigger::OutgoingCall => {
            format!("You had an outgoing call of {} duration.", duration())
        }
        Trigger::MissedCall => "You had a missed call.".to_string(),
    }
}

fn footer_lines(event: &PhoneEvent, options: &ContentOptions, context: &MailContext) -> Vec<String> {
    let mut lines = Vec::new();

    if options.caller {
        let label = match event.category() {
            Trigger::IncomingSms => "Sender",
            Trigger::OutgoingSms => "Recipient",
            Trigger::IncomingCall | Trigger::MissedCall => "Caller",
            Trigger::OutgoingCall => "Called",
        };
        lines.push(match &context.contact_name {
            Some(name) => format!("{label}: {name} ({})", event.phone),
            None => format!("{label}: {}", event.phone),
        });
    }

    if options.event_time
        && let Some(started) = event.started_at()
    {
        lines.push(format!(
            "Time: {}",
            started
                .with_timezone(&context.time_zone)
                .format("%Y-%m-%d %H:%M:%S %:z")
        ));
    }

    if options.device_name && !context.device_name.trim().is_empty() {
        lines.push(format!("Device: {}", context.device_name.trim()));
    }

    if options.location
        && let Some(location) = event.location
    {
        lines.push(format!(
            "Location: https://www.google.com/maps/place/{}+{}",
            location.latitude, location.longitude
        ));
    }

    if options.remote_control_links
        && let Some(address) = &context.reply_address
    {
        lines.push(format!(
            "Add to blacklist: {}",
            command_link(address, event, "add \"{}\" to blacklist")
        ));
        lines.push(format!(
            "Add to whitelist: {}",
            command_link(address, event, "add \"{}\" to whitelist")
        ));
    }

    lines
}

/// `mailto:` link replying with a command for the event's number.
fn command_link(address: &str, event: &PhoneEvent, template: &str) -> String {
    let subject = format!("Re: {}", format_subject(event));
    let body = template.replace("{}", &event.phone);
    format!(
        "mailto:{address}?subject={}&body={}",
        urlencoding::encode(&subject),
        urlencoding::encode(&body)
    )
}

/// `H:MM:SS`.
fn format_duration(duration: TimeDelta) -> String {
    let seconds = duration.num_seconds().max(0);
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Direction, GeoCoordinates};

    fn utc_context() -> MailContext {
        MailContext {
            device_name: "Pixel".to_string(),
            contact_name: Some("Alice".to_string()),
            reply_address: Some("phone@example.com".to_string()),
            time_zone: FixedOffset::east_opt(0).unwrap_or_else(|| *Local::now().offset()),
        }
    }

    const NO_FOOTER: ContentOptions = ContentOptions {
        caller: false,
        device_name: false,
        event_time: false,
        location: false,
        remote_control_links: false,
    };

    #[test]
    fn test_subjects_by_category() {
        assert_eq!(
            format_subject(&PhoneEvent::incoming_sms("555", "hi", 0)),
            "[SMailer] Incoming SMS from 555"
        );
        assert_eq!(
            format_subject(&PhoneEvent::outgoing_sms("555", "hi", 0)),
            "[SMailer] Outgoing SMS to 555"
        );
        assert_eq!(
            format_subject(&PhoneEvent::missed_call("555", 0)),
            "[SMailer] Missed call from 555"
        );
        assert_eq!(
            format_subject(&PhoneEvent::call("555", Direction::Outgoing, 0, 1)),
            "[SMailer] Outgoing call to 555"
        );
    }

    #[test]
    fn test_body_without_footer() {
        let sms = PhoneEvent::incoming_sms("555", "hello", 0);
        assert_eq!(format_body(&sms, &NO_FOOTER, &utc_context()), "hello");

        let call = PhoneEvent::call("555", Direction::Incoming, 0, 3_725_000);
        assert_eq!(
            format_body(&call, &NO_FOOTER, &utc_context()),
            "You had an incoming call of 1:02:05 duration."
        );

        let missed = PhoneEvent::missed_call("555", 0);
        assert_eq!(
            format_body(&missed, &NO_FOOTER, &utc_context()),
            "You had a missed call."
        );
    }

    #[test]
    fn test_full_footer() {
        let mut sms = PhoneEvent::incoming_sms("555", "hello", 0);
        sms.location = Some(GeoCoordinates::new(51.5, -0.25));
        let options = ContentOptions {
            remote_control_links: true,
            ..ContentOptions::default()
        };

        let body = format_body(&sms, &options, &utc_context());
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines[0], "hello");
        assert_eq!(lines[2], "---");
        assert_eq!(lines[3], "Sender: Alice (555)");
        assert_eq!(lines[4], "Time: 1970-01-01 00:00:00 +00:00");
        assert_eq!(lines[5], "Device: Pixel");
        assert_eq!(
            lines[6],
            "Location: https://www.google.com/maps/place/51.5+-0.25"
        );
        assert!(lines[7].starts_with("Add to blacklist: mailto:phone@example.com?subject=Re%3A%20"));
        assert!(lines[7].ends_with("&body=add%20%22555%22%20to%20blacklist"));
    }

    #[test]
    fn test_footer_lines_are_independent() {
        let sms = PhoneEvent::incoming_sms("555", "hello", 0);
        let options = ContentOptions {
            device_name: true,
            ..NO_FOOTER
        };

        assert_eq!(
            format_body(&sms, &options, &utc_context()),
            "hello\n\n---\nDevice: Pixel"
        );
    }

    #[test]
    fn test_location_line_needs_coordinates() {
        let sms = PhoneEvent::incoming_sms("555", "hello", 0);
        let options = ContentOptions {
            location: true,
            ..NO_FOOTER
        };
        assert_eq!(format_body(&sms, &options, &utc_context()), "hello");
    }
}
