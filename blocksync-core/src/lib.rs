//! Core of blocksync: one-way, privacy-scrubbed calendar syncing.
//!
//! Source events are projected into anonymous "blocks" whose ids are keyed
//! hashes of their content. The destination calendar's own UIDs are then the
//! only sync state:
//! - `identity` derives the ids
//! - `projection` and `desired` build the set of blocks that should exist
//! - `reconcile` diffs that set against the destination listing and applies it
//! - `sync` runs the whole pipeline against the `provider` traits

pub mod desired;
pub mod error;
pub mod event;
pub mod ics;
pub mod identity;
pub mod policy;
pub mod projection;
pub mod provider;
pub mod reconcile;
pub mod settings;
pub mod sync;
pub mod window;
pub mod xml;

#[cfg(test)]
mod testing;

pub use error::{SyncError, SyncResult};
pub use event::{CalendarRef, ProjectedEvent, RemoteEvent, RemoteHandle, SourceEvent};
