//! Connection to the destination server and the URL arithmetic around it.
//!
//! Settings carry absolute URLs (`nc_url`, `CalendarRef.url`) while WebDAV
//! requests and multistatus bodies speak in server-relative hrefs.

use blocksync_core::{SyncError, SyncResult};
use http::Uri;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use libdav::CalDavClient;
use libdav::dav::WebDavClient;
use tower::ServiceBuilder;
use tower_http::{auth::AddAuthorization, follow_redirect::FollowRedirect};
use url::Url;

/// hyper client behind basic auth, following redirects.
type HttpClient = FollowRedirect<
    AddAuthorization<
        Client<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>, String>,
    >,
>;

/// CalDAV client used for every destination request.
pub type BasicAuthCalDavClient = CalDavClient<HttpClient>;

/// Client for the calendar home at `base_url`, authenticating every request
/// with `nc_username`/`nc_password`. Servers reached over plain HTTP (a local
/// Nextcloud, say) are accepted as well.
pub fn create_caldav_client(
    base_url: &str,
    username: &str,
    password: &str,
) -> SyncResult<BasicAuthCalDavClient> {
    let uri: Uri = base_url.parse().map_err(|e| SyncError::InvalidSetting {
        key: "nc_url",
        reason: format!("{base_url}: {e}"),
    })?;

    let https_connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| SyncError::Destination(format!("Failed to load native TLS roots: {e}")))?
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);

    let auth_client = AddAuthorization::basic(http_client, username, password);

    let client = ServiceBuilder::new()
        .layer(tower_http::follow_redirect::FollowRedirectLayer::new())
        .service(auth_client);

    let webdav = WebDavClient::new(uri, client);
    Ok(CalDavClient::new(webdav))
}

/// Resource URL a surrogate is stored under: its id with an `.ics` suffix.
pub fn event_url(calendar_url: &str, id: &str) -> String {
    format!("{}/{id}.ics", calendar_url.trim_end_matches('/'))
}

/// Server-relative href of an absolute URL. Hrefs pass through unchanged.
pub fn url_to_href(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    }
}

/// Resolve an href from a multistatus response against the URL it came from.
pub fn href_to_url(base_url: &str, href: &str) -> SyncResult<String> {
    let base = Url::parse(base_url).map_err(|e| SyncError::InvalidSetting {
        key: "nc_url",
        reason: format!("{base_url}: {e}"),
    })?;
    base.join(href)
        .map(|u| u.to_string())
        .map_err(|e| SyncError::Destination(format!("Server returned invalid href {href}: {e}")))
}

/// Parse the configured calendar home URL.
pub fn parse_home_url(home_url: &str) -> SyncResult<Url> {
    let url = Url::parse(home_url).map_err(|e| SyncError::InvalidSetting {
        key: "nc_url",
        reason: format!("{home_url}: {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(SyncError::InvalidSetting {
            key: "nc_url",
            reason: format!("{home_url} cannot hold calendars"),
        });
    }
    Ok(url)
}

/// URL of a child collection `name` below `home`, with a trailing slash.
pub fn collection_url(home: &Url, name: &str) -> String {
    let mut url = home.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(name).push("");
    }
    url.to_string()
}

/// Last non-empty path segment of an href, i.e. the calendar id.
pub fn last_segment(href: &str) -> &str {
    href.trim_end_matches('/').rsplit('/').next().unwrap_or(href)
}
