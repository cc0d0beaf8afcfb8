//! CalDAV destination calendar for blocksync.
//!
//! Talks to any RFC 4791 server (Nextcloud, Radicale, Baïkal, ...) with
//! basic authentication, using libdav for transport.

pub mod caldav;
mod destination;
pub mod requests;

pub use destination::CalDavDestination;
