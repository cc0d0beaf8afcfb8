//! Custom CalDAV requests.
//!
//! libdav covers resource creation. Discovery by display name, calendar
//! creation, full listings and tolerant deletes are implemented
//! here as additional [`DavRequest`]s.

use http::{Method, StatusCode};
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};

use blocksync_core::xml::escape_xml;

// ============================================================================
// Calendar discovery
// ============================================================================

/// PROPFIND (Depth 1) on a calendar home, listing its calendar collections.
pub struct FindCalendarCollections<'a> {
    home_href: &'a str,
}

impl<'a> FindCalendarCollections<'a> {
    pub fn new(home_href: &'a str) -> Self {
        Self { home_href }
    }
}

/// A calendar collection found below the home set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCollection {
    pub href: String,
    pub display_name: Option<String>,
}

#[derive(Debug)]
pub struct FindCalendarCollectionsResponse {
    pub calendars: Vec<CalendarCollection>,
}

impl DavRequest for FindCalendarCollections<'_> {
    type Response = FindCalendarCollectionsResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:displayname/>
    <d:resourcetype/>
  </d:prop>
</d:propfind>"#;

        Ok(PreparedRequest {
            method: Method::from_bytes(b"PROPFIND")?,
            path: self.home_href.to_string(),
            body: body.to_string(),
            headers: vec![
                ("Depth".to_string(), "1".to_string()),
                ("Content-Type".to_string(), "application/xml; charset=utf-8".to_string()),
            ],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let calendars = parse_calendar_collections(body)?;
        Ok(FindCalendarCollectionsResponse { calendars })
    }
}

/// Parse calendar collections from a PROPFIND multistatus response.
///
/// Only responses whose resourcetype includes a CalDAV `calendar` element are
/// returned, which excludes the home collection itself.
pub fn parse_calendar_collections(
    body: &[u8],
) -> std::result::Result<Vec<CalendarCollection>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    let mut calendars = Vec::new();

    for response in root.descendants().filter(|n| n.tag_name().name() == "response") {
        let Some(href) = child_text(response, "href") else { continue };

        let is_calendar = response
            .descendants()
            .filter(|n| n.tag_name().name() == "resourcetype")
            .flat_map(|n| n.children())
            .any(|n| n.tag_name().name() == "calendar");
        if !is_calendar {
            continue;
        }

        let display_name = child_text(response, "displayname").filter(|s| !s.is_empty());

        calendars.push(CalendarCollection { href, display_name });
    }

    Ok(calendars)
}

// ============================================================================
// Calendar creation
// ============================================================================

/// MKCALENDAR for a VEVENT collection with a display name.
pub struct MakeCalendar<'a> {
    href: &'a str,
    display_name: &'a str,
}

impl<'a> MakeCalendar<'a> {
    pub fn new(href: &'a str, display_name: &'a str) -> Self {
        Self { href, display_name }
    }
}

impl DavRequest for MakeCalendar<'_> {
    type Response = ();
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<c:mkcalendar xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:set>
    <d:prop>
      <d:displayname>{}</d:displayname>
      <c:supported-calendar-component-set>
        <c:comp name="VEVENT"/>
      </c:supported-calendar-component-set>
    </d:prop>
  </d:set>
</c:mkcalendar>"#,
            escape_xml(self.display_name)
        );

        Ok(PreparedRequest {
            method: Method::from_bytes(b"MKCALENDAR")?,
            path: self.href.to_string(),
            body,
            headers: vec![(
                "Content-Type".to_string(),
                "application/xml; charset=utf-8".to_string(),
            )],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        _body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }
        Ok(())
    }
}

// ============================================================================
// Listing
// ============================================================================

/// calendar-query REPORT returning the data of every VEVENT resource in a
/// collection.
pub struct ListCalendarResources<'a> {
    collection_href: &'a str,
}

impl<'a> ListCalendarResources<'a> {
    pub fn new(collection_href: &'a str) -> Self {
        Self { collection_href }
    }
}

/// A fetched calendar resource with its ICS data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarResource {
    pub href: String,
    pub data: String,
}

#[derive(Debug)]
pub struct ListCalendarResourcesResponse {
    pub resources: Vec<CalendarResource>,
}

impl DavRequest for ListCalendarResources<'_> {
    type Response = ListCalendarResourcesResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let body = r#"<C:calendar-query xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <C:calendar-data/>
    </prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT"/>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#;

        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.collection_href.to_string(),
            body: body.to_string(),
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let resources = parse_calendar_resources(body)?;
        Ok(ListCalendarResourcesResponse { resources })
    }
}

/// Parse calendar resources from a CalDAV multistatus response.
pub fn parse_calendar_resources(
    body: &[u8],
) -> std::result::Result<Vec<CalendarResource>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    let mut resources = Vec::new();

    for response in root.descendants().filter(|n| n.tag_name().name() == "response") {
        let Some(href) = child_text(response, "href") else { continue };

        // Only include resources that have calendar data
        if let Some(data) = child_text(response, "calendar-data") {
            resources.push(CalendarResource { href, data });
        }
    }

    Ok(resources)
}

// ============================================================================
// Deletion
// ============================================================================

/// DELETE of a single resource. A resource that is already gone counts as
/// deleted.
pub struct DeleteResource<'a> {
    href: &'a str,
}

impl<'a> DeleteResource<'a> {
    pub fn new(href: &'a str) -> Self {
        Self { href }
    }
}

impl DavRequest for DeleteResource<'_> {
    type Response = ();
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        Ok(PreparedRequest {
            method: Method::DELETE,
            path: self.href.to_string(),
            body: String::new(),
            headers: vec![],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        _body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if parts.status.is_success() || parts.status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(ParseResponseError::BadStatusCode(parts.status))
        }
    }
}

/// Trimmed text of the first descendant named `name`.
fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
}
