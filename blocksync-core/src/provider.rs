//! Collaborator interfaces for the source and destination calendars.
//!
//! Providers own their transport and credentials. Core only calls these
//! traits, one request at a time.

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::event::{CalendarRef, RemoteEvent, SourceEvent};
use crate::window::SyncWindow;

/// Read access to the calendar events are copied from.
#[async_trait]
pub trait SourceCalendar {
    /// Events overlapping `window`, with recurrences already expanded.
    async fn list_events(&self, window: &SyncWindow) -> SyncResult<Vec<SourceEvent>>;
}

/// Write access to the calendar surrogates are stored in.
#[async_trait]
pub trait DestinationCalendar {
    /// Look up a calendar by display name or id.
    async fn find_calendar(&self, name: &str) -> SyncResult<Option<CalendarRef>>;

    /// Where `create_calendar(name)` would put the calendar. Makes no request.
    fn planned_calendar(&self, name: &str) -> CalendarRef;

    async fn create_calendar(&self, name: &str) -> SyncResult<CalendarRef>;

    /// Every event currently stored in `calendar`.
    async fn list_events(&self, calendar: &CalendarRef) -> SyncResult<Vec<RemoteEvent>>;

    /// Store a new event. `id` is the event's UID, `ics` its serialized VCALENDAR.
    async fn create_event(&self, calendar: &CalendarRef, id: &str, ics: &str) -> SyncResult<()>;

    async fn delete_event(&self, event: &RemoteEvent) -> SyncResult<()>;
}
