//! ICS generation.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component};

use crate::error::{SyncError, SyncResult};
use crate::event::ProjectedEvent;

const PRODID: &str = "PRODID:-//blocksync//blocksync//EN";

/// Generate .ics content for a surrogate event.
pub fn generate_ics(event: &ProjectedEvent) -> SyncResult<String> {
    if event.id.is_empty() || event.id.contains(['\r', '\n', '/']) {
        return Err(SyncError::IcsGenerate(format!(
            "'{}' is not usable as a UID",
            event.id
        )));
    }

    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.id);
    ics_event.summary(&event.summary);
    ics_event.description(&event.description);

    // DTSTAMP is required by RFC 5545 and never part of the identity
    ics_event.add_property("DTSTAMP", format_utc(&Utc::now()));
    ics_event.add_property("DTSTART", format_utc(&event.start));
    ics_event.add_property("DTEND", format_utc(&event.end));

    let ics_event = ics_event.done();
    cal.push(ics_event);
    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our own
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
