//! ICS parsing using the icalendar crate's parser.

use icalendar::parser::{read_calendar, unfold};

/// Extract the UID of the first VEVENT in `content`.
pub fn parse_uid(content: &str) -> Option<String> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let uid = vevent.find_prop("UID")?.val.to_string();
    let uid = uid.trim();
    (!uid.is_empty()).then(|| uid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ProjectedEvent;
    use crate::ics::generate_ics;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_uid_from_generated_ics() {
        let event = ProjectedEvent {
            id: "ab".repeat(32),
            summary: "work appointment".to_string(),
            description: "test".to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap(),
        };

        let ics = generate_ics(&event).unwrap();

        assert_eq!(parse_uid(&ics), Some(event.id));
    }

    #[test]
    fn test_parse_uid_from_server_data() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Sabre//Sabre VObject 4.5.4//EN\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Europe/Vienna\r\n\
END:VTIMEZONE\r\n\
BEGIN:VEVENT\r\n\
UID:4f1c2b7e-manual\r\n\
SUMMARY:Created by hand\r\n\
DTSTART;TZID=Europe/Vienna:20250320T150000\r\n\
DTEND;TZID=Europe/Vienna:20250320T160000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        assert_eq!(parse_uid(ics), Some("4f1c2b7e-manual".to_string()));
    }

    #[test]
    fn test_parse_uid_missing() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:No uid\r\n\
DTSTART:20250320T150000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        assert_eq!(parse_uid(ics), None);
    }

    #[test]
    fn test_parse_uid_garbage() {
        assert_eq!(parse_uid("not an ics file"), None);
    }
}
