use std::collections::BTreeSet;

use tracing::debug;

use crate::desired::DesiredSet;
use crate::event::{ProjectedEvent, RemoteEvent};

/// The fully decided set of changes for one run.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Remote ids that already match a desired surrogate
    pub keep: BTreeSet<String>,
    /// Remote events with no desired counterpart
    pub delete: Vec<RemoteEvent>,
    /// Desired surrogates missing on the remote, in id order
    pub create: Vec<ProjectedEvent>,
}

impl ReconcilePlan {
    /// Decide every delete and create before anything is mutated.
    pub fn compute(desired: &DesiredSet, remote: Vec<RemoteEvent>) -> Self {
        let mut plan = ReconcilePlan::default();

        for event in remote {
            if desired.contains(&event.id) {
                debug!(uid = %event.id, "Keeping remote event");
                plan.keep.insert(event.id);
            } else {
                debug!(uid = %event, href = %event.handle.href, "Remote event is stale");
                plan.delete.push(event);
            }
        }

        plan.create = desired
            .iter()
            .filter(|e| !plan.keep.contains(&e.id))
            .cloned()
            .collect();

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.create.is_empty()
    }

    /// Number of destination calls applying this plan takes.
    pub fn change_count(&self) -> usize {
        self.delete.len() + self.create.len()
    }
}
