//! Exchange Web Services source calendar.
//!
//! Reads the mailbox's default calendar through a FindItem CalendarView,
//! which has the server expand recurring series into single occurrences.

pub mod soap;
mod source;

pub use source::EwsSource;
