//! iCalendar serialization of surrogate events.
//!
//! Surrogates go out as a VCALENDAR with a single VEVENT (RFC 5545). On the
//! way back only the UID matters.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::parse_uid;
