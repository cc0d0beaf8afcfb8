//! Event types flowing through a sync run.
//!
//! Source providers produce `SourceEvent`s, the projector turns them into
//! `ProjectedEvent`s, and destination providers list what already exists as
//! `RemoteEvent`s.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An event as read from the source calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Some providers return items without a subject
    pub subject: Option<String>,
}

impl SourceEvent {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, subject: impl Into<String>) -> Self {
        SourceEvent {
            start,
            end,
            subject: Some(subject.into()),
        }
    }

    /// The subject, if present and non-empty.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }
}

/// The privacy-scrubbed surrogate written to the destination calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedEvent {
    /// Content-derived identifier, used verbatim as the iCalendar UID
    pub id: String,
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ProjectedEvent {
    /// Time range rendered for logs and error messages. Never includes the subject.
    pub fn time_range(&self) -> String {
        format!("{} - {}", format_instant(&self.start), format_instant(&self.end))
    }
}

impl fmt::Display for ProjectedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.summary, self.time_range())
    }
}

/// Reference to a calendar collection on the destination server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarRef {
    /// Absolute URL of the collection, also used as the identity container
    pub url: String,
    pub name: String,
}

impl fmt::Display for CalendarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.url)
    }
}

/// Opaque handle a destination provider needs to delete a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHandle {
    pub href: String,
}

/// An event currently stored on the destination calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// UID of the stored event, empty when the resource carries none
    pub id: String,
    pub handle: RemoteHandle,
}

impl fmt::Display for RemoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id.is_empty() {
            write!(f, "<no uid> at {}", self.handle.href)
        } else {
            write!(f, "{}", self.id)
        }
    }
}

/// RFC 3339 UTC with second precision, e.g. `2025-03-20T15:00:00Z`.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
