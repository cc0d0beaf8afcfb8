use std::collections::BTreeSet;

use tracing::{debug, error, info};

use crate::error::{SyncError, SyncResult};
use crate::event::CalendarRef;
use crate::ics::generate_ics;
use crate::provider::DestinationCalendar;
use crate::reconcile::{ChangeKind, ReconcilePlan};

/// A single create or delete that the destination rejected.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub id: String,
    pub kind: ChangeKind,
    pub cause: String,
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub kept: BTreeSet<String>,
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

impl ReconcileReport {
    pub fn attempted(&self) -> usize {
        self.created.len() + self.deleted.len() + self.failures.len()
    }

    /// Turn per-item failures into a run-level error.
    pub fn into_result(self) -> SyncResult<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(SyncError::ItemFailures {
                failed: self.failures.len(),
                attempted: self.attempted(),
            })
        }
    }

    fn record_failure(&mut self, id: &str, kind: ChangeKind, cause: SyncError) {
        error!(uid = %id, operation = %kind, "Failed to {kind} event: {cause}");
        self.failures.push(ItemFailure {
            id: id.to_string(),
            kind,
            cause: cause.to_string(),
        });
    }
}

impl ReconcilePlan {
    /// Run every delete, then every create. A failing item is recorded and
    /// the remaining items are still processed.
    pub async fn apply<D>(&self, destination: &D, calendar: &CalendarRef) -> ReconcileReport
    where
        D: DestinationCalendar + ?Sized,
    {
        let mut report = ReconcileReport {
            kept: self.keep.clone(),
            ..ReconcileReport::default()
        };

        for event in &self.delete {
            debug!(uid = %event, "Deleting event");
            match destination.delete_event(event).await {
                Ok(()) => report.deleted.push(event.id.clone()),
                Err(e) => report.record_failure(&event.id, ChangeKind::Delete, e),
            }
        }

        for event in &self.create {
            debug!(uid = %event.id, "Adding event");
            let result = match generate_ics(event) {
                Ok(ics) => destination.create_event(calendar, &event.id, &ics).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => report.created.push(event.id.clone()),
                Err(e) => report.record_failure(&event.id, ChangeKind::Create, e),
            }
        }

        info!(
            kept = report.kept.len(),
            created = report.created.len(),
            deleted = report.deleted.len(),
            failed = report.failures.len(),
            "Reconciled {calendar}"
        );

        report
    }
}
