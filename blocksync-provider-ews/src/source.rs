use async_trait::async_trait;
use blocksync_core::provider::SourceCalendar;
use blocksync_core::window::SyncWindow;
use blocksync_core::{SourceEvent, SyncError, SyncResult};
use tracing::debug;

use crate::soap::{find_items_request, parse_find_items_response};

/// Source calendar read over Exchange Web Services with basic auth.
pub struct EwsSource {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
}

impl EwsSource {
    pub fn new(host: &str, username: &str, password: &str) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("blocksync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Source(format!("Failed to create HTTP client: {e}")))?;

        Ok(EwsSource {
            http,
            endpoint: endpoint_url(host),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// SMTP address of the mailbox to read, when the username is one.
    fn mailbox(&self) -> Option<&str> {
        self.username.contains('@').then_some(self.username.as_str())
    }
}

#[async_trait]
impl SourceCalendar for EwsSource {
    async fn list_events(&self, window: &SyncWindow) -> SyncResult<Vec<SourceEvent>> {
        debug!("FindItem {window} at {}", self.endpoint);

        let resp = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "text/xml; charset=utf-8")
            .body(find_items_request(window, self.mailbox()))
            .send()
            .await
            .map_err(|e| SyncError::Source(format!("Failed to reach {}: {e}", self.endpoint)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::Source(format!("Failed to read EWS response: {e}")))?;

        // Faults arrive with a 500 status and still carry a useful message
        if !status.is_success() && !body.contains("Envelope") {
            return Err(SyncError::Source(format!("EWS request failed (HTTP {status})")));
        }

        parse_find_items_response(&body)
    }
}

/// `https://{host}/EWS/Exchange.asmx`, unless `host` already names a scheme.
fn endpoint_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("https://") || host.starts_with("http://") {
        format!("{host}/EWS/Exchange.asmx")
    } else {
        format!("https://{host}/EWS/Exchange.asmx")
    }
}
