//! Reconciliation of the desired set against the destination listing.
//!
//! Ids are content-derived, so an id present on both sides is already
//! correct and stays untouched. Everything else is either stale (delete) or
//! missing (create). There are no in-place updates.

mod apply;
mod change_kind;
mod plan;

pub use apply::{ItemFailure, ReconcileReport};
pub use change_kind::ChangeKind;
pub use plan::ReconcilePlan;

use crate::desired::DesiredSet;
use crate::event::{CalendarRef, RemoteEvent};
use crate::provider::DestinationCalendar;

/// Plan against `remote` and apply the plan to `calendar`.
pub async fn reconcile<D>(
    desired: &DesiredSet,
    remote: Vec<RemoteEvent>,
    destination: &D,
    calendar: &CalendarRef,
) -> ReconcileReport
where
    D: DestinationCalendar + ?Sized,
{
    ReconcilePlan::compute(desired, remote)
        .apply(destination, calendar)
        .await
}
