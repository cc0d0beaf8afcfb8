//! CalDAV implementation of the destination calendar.

use async_trait::async_trait;
use blocksync_core::ics::parse_uid;
use blocksync_core::provider::DestinationCalendar;
use blocksync_core::{CalendarRef, RemoteEvent, RemoteHandle, SyncError, SyncResult};
use libdav::dav::{PutResource, mime_types};
use tracing::debug;
use url::Url;

use crate::caldav::{
    BasicAuthCalDavClient, collection_url, create_caldav_client, event_url, href_to_url,
    last_segment, parse_home_url, url_to_href,
};
use crate::requests::{DeleteResource, FindCalendarCollections, ListCalendarResources, MakeCalendar};

/// Destination calendar on a CalDAV server, rooted at a calendar home.
pub struct CalDavDestination {
    caldav: BasicAuthCalDavClient,
    home: Url,
}

impl CalDavDestination {
    /// Connect to the calendar home at `home_url` with basic auth.
    pub fn new(home_url: &str, username: &str, password: &str) -> SyncResult<Self> {
        let home = parse_home_url(home_url)?;
        let caldav = create_caldav_client(home.as_str(), username, password)?;
        Ok(CalDavDestination { caldav, home })
    }
}

#[async_trait]
impl DestinationCalendar for CalDavDestination {
    async fn find_calendar(&self, name: &str) -> SyncResult<Option<CalendarRef>> {
        let home_href = url_to_href(self.home.as_str());
        let response = self
            .caldav
            .request(FindCalendarCollections::new(&home_href))
            .await
            .map_err(|e| SyncError::Destination(format!("Failed to list calendars: {e}")))?;

        let expected_url = collection_url(&self.home, name);

        for collection in response.calendars {
            let url = href_to_url(self.home.as_str(), &collection.href)?;
            let matches = collection.display_name.as_deref() == Some(name)
                || last_segment(&collection.href) == name
                || url == expected_url;

            if matches {
                debug!("Found calendar {name} at {url}");
                return Ok(Some(CalendarRef {
                    url,
                    name: name.to_string(),
                }));
            }
        }

        Ok(None)
    }

    fn planned_calendar(&self, name: &str) -> CalendarRef {
        CalendarRef {
            url: collection_url(&self.home, name),
            name: name.to_string(),
        }
    }

    async fn create_calendar(&self, name: &str) -> SyncResult<CalendarRef> {
        let calendar = self.planned_calendar(name);
        let href = url_to_href(&calendar.url);

        self.caldav
            .request(MakeCalendar::new(&href, name))
            .await
            .map_err(|e| SyncError::Destination(format!("Failed to create calendar {name}: {e}")))?;

        debug!("Created calendar {calendar}");
        Ok(calendar)
    }

    async fn list_events(&self, calendar: &CalendarRef) -> SyncResult<Vec<RemoteEvent>> {
        let calendar_href = url_to_href(&calendar.url);
        let response = self
            .caldav
            .request(ListCalendarResources::new(&calendar_href))
            .await
            .map_err(|e| {
                SyncError::Destination(format!("Failed to list events in {}: {e}", calendar.name))
            })?;

        let events = response
            .resources
            .into_iter()
            .map(|resource| RemoteEvent {
                id: parse_uid(&resource.data).unwrap_or_default(),
                handle: RemoteHandle { href: resource.href },
            })
            .collect();

        Ok(events)
    }

    async fn create_event(&self, calendar: &CalendarRef, id: &str, ics: &str) -> SyncResult<()> {
        let href = url_to_href(&event_url(&calendar.url, id));

        // PUT with If-None-Match: * (fails if exists)
        self.caldav
            .request(PutResource::new(&href).create(ics, mime_types::CALENDAR))
            .await
            .map_err(|e| SyncError::Destination(format!("PUT {href}: {e}")))?;

        debug!("Stored {href}");
        Ok(())
    }

    async fn delete_event(&self, event: &RemoteEvent) -> SyncResult<()> {
        let href = url_to_href(&event.handle.href);

        self.caldav
            .request(DeleteResource::new(&href))
            .await
            .map_err(|e| SyncError::Destination(format!("DELETE {href}: {e}")))?;

        debug!("Removed {href}");
        Ok(())
    }
}
