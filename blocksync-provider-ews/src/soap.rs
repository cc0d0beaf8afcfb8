//! FindItem request building and response parsing.

use blocksync_core::window::SyncWindow;
use blocksync_core::xml::escape_xml;
use blocksync_core::{SourceEvent, SyncError, SyncResult};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

const TYPES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/types";
const MESSAGES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP envelope for a CalendarView FindItem over `window`.
///
/// `mailbox` selects whose calendar is read. Without it the server uses the
/// authenticated account's own calendar.
pub fn find_items_request(window: &SyncWindow, mailbox: Option<&str>) -> String {
    let folder = match mailbox {
        Some(address) => format!(
            r#"<t:DistinguishedFolderId Id="calendar"><t:Mailbox><t:EmailAddress>{}</t:EmailAddress></t:Mailbox></t:DistinguishedFolderId>"#,
            escape_xml(address)
        ),
        None => r#"<t:DistinguishedFolderId Id="calendar"/>"#.to_string(),
    };

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="{SOAP_NS}" xmlns:t="{TYPES_NS}" xmlns:m="{MESSAGES_NS}">
  <soap:Header>
    <t:RequestServerVersion Version="Exchange2013"/>
  </soap:Header>
  <soap:Body>
    <m:FindItem Traversal="Shallow">
      <m:ItemShape>
        <t:BaseShape>IdOnly</t:BaseShape>
        <t:AdditionalProperties>
          <t:FieldURI FieldURI="item:Subject"/>
          <t:FieldURI FieldURI="calendar:Start"/>
          <t:FieldURI FieldURI="calendar:End"/>
        </t:AdditionalProperties>
      </m:ItemShape>
      <m:CalendarView StartDate="{start}" EndDate="{end}"/>
      <m:ParentFolderIds>
        {folder}
      </m:ParentFolderIds>
    </m:FindItem>
  </soap:Body>
</soap:Envelope>"#,
        start = ews_timestamp(&window.start),
        end = ews_timestamp(&window.end),
    )
}

/// Calendar items from a FindItem response.
///
/// An error response class or a SOAP fault becomes a source error carrying
/// the server's message. So does a truncated view, since a partial listing
/// would delete the blocks of every event past the cut-off. Items lacking a
/// start or end are skipped.
pub fn parse_find_items_response(body: &str) -> SyncResult<Vec<SourceEvent>> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| SyncError::Source(format!("Malformed EWS response: {e}")))?;
    let root = doc.root_element();

    if let Some(fault) = root.descendants().find(|n| n.has_tag_name((SOAP_NS, "Fault"))) {
        let reason = fault
            .descendants()
            .find(|n| n.tag_name().name() == "faultstring")
            .and_then(|n| n.text())
            .unwrap_or("SOAP fault");
        return Err(SyncError::Source(reason.trim().to_string()));
    }

    let message = root
        .descendants()
        .find(|n| n.has_tag_name((MESSAGES_NS, "FindItemResponseMessage")))
        .ok_or_else(|| SyncError::Source("EWS response has no FindItemResponseMessage".to_string()))?;

    if message.attribute("ResponseClass") != Some("Success") {
        let text = child_text(message, MESSAGES_NS, "MessageText")
            .or_else(|| child_text(message, MESSAGES_NS, "ResponseCode"))
            .unwrap_or_else(|| "unknown EWS error".to_string());
        return Err(SyncError::Source(text));
    }

    if let Some(folder) = message
        .descendants()
        .find(|n| n.has_tag_name((MESSAGES_NS, "RootFolder")))
        && folder.attribute("IncludesLastItemInRange") == Some("false")
    {
        let total = folder.attribute("TotalItemsInView").unwrap_or("?");
        return Err(SyncError::Source(format!(
            "EWS truncated the calendar view ({total} items in range), refusing to sync a partial listing"
        )));
    }

    let mut events = Vec::new();

    for item in message
        .descendants()
        .filter(|n| n.has_tag_name((TYPES_NS, "CalendarItem")))
    {
        let start = child_text(item, TYPES_NS, "Start").map(|s| parse_timestamp(&s)).transpose()?;
        let end = child_text(item, TYPES_NS, "End").map(|s| parse_timestamp(&s)).transpose()?;

        let (Some(start), Some(end)) = (start, end) else {
            warn!("Skipping calendar item without start or end");
            continue;
        };

        events.push(SourceEvent {
            start,
            end,
            subject: raw_child_text(item, TYPES_NS, "Subject"),
        });
    }

    Ok(events)
}

/// EWS wants UTC timestamps without fractional seconds.
fn ews_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(value: &str) -> SyncResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SyncError::Source(format!("Invalid EWS timestamp {value}: {e}")))
}

/// Text of the first child element `name`, as sent.
fn raw_child_text(node: roxmltree::Node<'_, '_>, ns: &str, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name((ns, name)))
        .and_then(|n| n.text())
        .map(str::to_string)
}

/// Trimmed text, for timestamps and codes.
fn child_text(node: roxmltree::Node<'_, '_>, ns: &str, name: &str) -> Option<String> {
    raw_child_text(node, ns, name).map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SUCCESS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <m:FindItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                        xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
      <m:ResponseMessages>
        <m:FindItemResponseMessage ResponseClass="Success">
          <m:ResponseCode>NoError</m:ResponseCode>
          <m:RootFolder TotalItemsInView="3" IncludesLastItemInRange="true">
            <t:Items>
              <t:CalendarItem>
                <t:ItemId Id="AAA=" ChangeKey="x"/>
                <t:Subject>Team Sync</t:Subject>
                <t:Start>2025-03-17T08:00:00Z</t:Start>
                <t:End>2025-03-17T09:00:00Z</t:End>
              </t:CalendarItem>
              <t:CalendarItem>
                <t:ItemId Id="BBB=" ChangeKey="y"/>
                <t:Start>2025-03-18T13:00:00Z</t:Start>
                <t:End>2025-03-18T14:00:00Z</t:End>
              </t:CalendarItem>
              <t:CalendarItem>
                <t:ItemId Id="CCC=" ChangeKey="z"/>
                <t:Subject>Broken</t:Subject>
              </t:CalendarItem>
            </t:Items>
          </m:RootFolder>
        </m:FindItemResponseMessage>
      </m:ResponseMessages>
    </m:FindItemResponse>
  </s:Body>
</s:Envelope>"#;

    const TRUNCATED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <m:FindItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                        xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
      <m:ResponseMessages>
        <m:FindItemResponseMessage ResponseClass="Success">
          <m:ResponseCode>NoError</m:ResponseCode>
          <m:RootFolder TotalItemsInView="1200" IncludesLastItemInRange="false">
            <t:Items>
              <t:CalendarItem>
                <t:Subject> Team Sync</t:Subject>
                <t:Start>2025-03-17T08:00:00Z</t:Start>
                <t:End>2025-03-17T09:00:00Z</t:End>
              </t:CalendarItem>
            </t:Items>
          </m:RootFolder>
        </m:FindItemResponseMessage>
      </m:ResponseMessages>
    </m:FindItemResponse>
  </s:Body>
</s:Envelope>"#;

    const ERROR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <m:FindItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
      <m:ResponseMessages>
        <m:FindItemResponseMessage ResponseClass="Error">
          <m:MessageText>The specified folder could not be found in the store.</m:MessageText>
          <m:ResponseCode>ErrorFolderNotFound</m:ResponseCode>
        </m:FindItemResponseMessage>
      </m:ResponseMessages>
    </m:FindItemResponse>
  </s:Body>
</s:Envelope>"#;

    const FAULT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <s:Fault>
      <faultcode>a:ErrorSchemaValidation</faultcode>
      <faultstring xml:lang="en-US">The request failed schema validation.</faultstring>
    </s:Fault>
  </s:Body>
</s:Envelope>"#;

    #[test]
    fn test_parse_success() {
        let events = parse_find_items_response(SUCCESS).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject.as_deref(), Some("Team Sync"));
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2025, 3, 17, 8, 0, 0).unwrap());
        assert_eq!(events[0].end, Utc.with_ymd_and_hms(2025, 3, 17, 9, 0, 0).unwrap());
        assert_eq!(events[1].subject, None);
    }

    #[test]
    fn test_parse_truncated_view_is_an_error() {
        let err = parse_find_items_response(TRUNCATED).unwrap_err();
        assert!(matches!(err, SyncError::Source(msg) if msg.contains("truncated")));
    }

    #[test]
    fn test_parse_keeps_subject_whitespace() {
        let body = TRUNCATED.replace(r#"IncludesLastItemInRange="false""#, r#"IncludesLastItemInRange="true""#);

        let events = parse_find_items_response(&body).unwrap();

        assert_eq!(events[0].subject.as_deref(), Some(" Team Sync"));
    }

    #[test]
    fn test_parse_error_class() {
        let err = parse_find_items_response(ERROR).unwrap_err();
        match err {
            SyncError::Source(msg) => {
                assert_eq!(msg, "The specified folder could not be found in the store.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fault() {
        let err = parse_find_items_response(FAULT).unwrap_err();
        assert!(matches!(err, SyncError::Source(msg) if msg == "The request failed schema validation."));
    }

    #[test]
    fn test_parse_rejects_non_xml() {
        assert!(matches!(
            parse_find_items_response("<html>Bad gateway"),
            Err(SyncError::Source(_))
        ));
    }

    #[test]
    fn test_request_covers_window_and_mailbox() {
        let window = SyncWindow {
            start: Utc.with_ymd_and_hms(2025, 3, 16, 23, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 23, 23, 0, 0).unwrap(),
        };

        let request = find_items_request(&window, Some("a&b@example.com"));

        assert!(request.contains(r#"StartDate="2025-03-16T23:00:00Z""#));
        assert!(request.contains(r#"EndDate="2025-03-23T23:00:00Z""#));
        assert!(request.contains("<t:EmailAddress>a&amp;b@example.com</t:EmailAddress>"));
        assert!(roxmltree::Document::parse(&request).is_ok());
    }

    #[test]
    fn test_request_without_mailbox() {
        let window = SyncWindow {
            start: Utc.with_ymd_and_hms(2025, 3, 16, 23, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 23, 23, 0, 0).unwrap(),
        };

        let request = find_items_request(&window, None);

        assert!(request.contains(r#"<t:DistinguishedFolderId Id="calendar"/>"#));
        assert!(!request.contains("Mailbox"));
    }
}
