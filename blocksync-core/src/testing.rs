//! In-memory providers for tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{SyncError, SyncResult};
use crate::event::{CalendarRef, RemoteEvent, RemoteHandle, SourceEvent};
use crate::ics::parse_uid;
use crate::provider::{DestinationCalendar, SourceCalendar};
use crate::window::SyncWindow;

const BASE_URL: &str = "https://dav.example.com/calendars/me";

#[derive(Default)]
pub struct MemoryDestination {
    calendars: Mutex<Vec<CalendarRef>>,
    /// href -> ics
    resources: Mutex<BTreeMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    pub fail_listing: Mutex<bool>,
    pub calls: Mutex<Vec<String>>,
}

impl MemoryDestination {
    pub fn with_calendar(name: &str) -> Self {
        let dest = MemoryDestination::default();
        dest.calendars.lock().unwrap().push(calendar_ref(name));
        dest
    }

    pub fn calendar(&self, name: &str) -> CalendarRef {
        self.calendars
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .expect("calendar exists")
    }

    pub fn listing(&self, calendar: &CalendarRef) -> Vec<RemoteEvent> {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .filter(|(href, _)| href.starts_with(&calendar.url))
            .map(|(href, ics)| RemoteEvent {
                id: parse_uid(ics).unwrap_or_default(),
                handle: RemoteHandle { href: href.clone() },
            })
            .collect()
    }

    pub fn stored_ids(&self, calendar: &CalendarRef) -> Vec<String> {
        let mut ids: Vec<_> = self.listing(calendar).into_iter().map(|e| e.id).collect();
        ids.sort();
        ids
    }

    pub fn stored_ics(&self, calendar: &CalendarRef, id: &str) -> Option<String> {
        self.resources
            .lock()
            .unwrap()
            .get(&resource_href(calendar, id))
            .cloned()
    }

    /// Store a raw resource, bypassing `create_event`.
    pub fn insert_raw(&self, calendar: &CalendarRef, name: &str, ics: &str) {
        self.resources
            .lock()
            .unwrap()
            .insert(resource_href(calendar, name), ics.to_string());
    }

    /// Make creates and deletes of `id` fail.
    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with("create") || c.starts_with("delete"))
            .count()
    }

    fn check(&self, id: &str) -> SyncResult<()> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(SyncError::Destination(format!("rejected {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DestinationCalendar for MemoryDestination {
    async fn find_calendar(&self, name: &str) -> SyncResult<Option<CalendarRef>> {
        self.calls.lock().unwrap().push(format!("find {name}"));
        Ok(self
            .calendars
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    fn planned_calendar(&self, name: &str) -> CalendarRef {
        calendar_ref(name)
    }

    async fn create_calendar(&self, name: &str) -> SyncResult<CalendarRef> {
        self.calls.lock().unwrap().push(format!("mkcalendar {name}"));
        let calendar = self.planned_calendar(name);
        self.calendars.lock().unwrap().push(calendar.clone());
        Ok(calendar)
    }

    async fn list_events(&self, calendar: &CalendarRef) -> SyncResult<Vec<RemoteEvent>> {
        self.calls.lock().unwrap().push(format!("list {}", calendar.name));
        if *self.fail_listing.lock().unwrap() {
            return Err(SyncError::Destination("listing unavailable".to_string()));
        }
        Ok(self.listing(calendar))
    }

    async fn create_event(&self, calendar: &CalendarRef, id: &str, ics: &str) -> SyncResult<()> {
        self.calls.lock().unwrap().push(format!("create {id}"));
        self.check(id)?;
        self.resources
            .lock()
            .unwrap()
            .insert(resource_href(calendar, id), ics.to_string());
        Ok(())
    }

    async fn delete_event(&self, event: &RemoteEvent) -> SyncResult<()> {
        self.calls.lock().unwrap().push(format!("delete {}", event.id));
        self.check(&event.id)?;
        self.resources.lock().unwrap().remove(&event.handle.href);
        Ok(())
    }
}

/// Source returning a fixed list, recording the window it was asked for.
#[derive(Default)]
pub struct MemorySource {
    pub events: Vec<SourceEvent>,
    pub requested: Mutex<Vec<SyncWindow>>,
    pub fail: bool,
}

impl MemorySource {
    pub fn new(events: Vec<SourceEvent>) -> Self {
        MemorySource {
            events,
            ..MemorySource::default()
        }
    }
}

#[async_trait]
impl SourceCalendar for MemorySource {
    async fn list_events(&self, window: &SyncWindow) -> SyncResult<Vec<SourceEvent>> {
        self.requested.lock().unwrap().push(window.clone());
        if self.fail {
            return Err(SyncError::Source("401 Unauthorized".to_string()));
        }
        Ok(self.events.clone())
    }
}

fn calendar_ref(name: &str) -> CalendarRef {
    CalendarRef {
        url: format!("{BASE_URL}/{name}/"),
        name: name.to_string(),
    }
}

fn resource_href(calendar: &CalendarRef, name: &str) -> String {
    format!("{}{}.ics", calendar.url, name)
}
