//! The set of surrogates that should exist after a run.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::event::{ProjectedEvent, SourceEvent};
use crate::identity::IdDeriver;
use crate::projection::Projector;

/// Surrogates keyed by their derived id.
#[derive(Debug, Clone, Default)]
pub struct DesiredSet {
    events: BTreeMap<String, ProjectedEvent>,
    /// Number of source events dropped by the ignore policy
    pub ignored: usize,
}

impl DesiredSet {
    /// Filter and project `items`, refusing to let two different surrogates
    /// share one id.
    pub fn build<D: IdDeriver>(items: &[SourceEvent], projector: &Projector<'_, D>) -> SyncResult<Self> {
        let mut set = DesiredSet::default();

        for item in items {
            if projector.policy().is_ignored(item.subject()) {
                info!("Ignoring one entry that matches subject_ignore_re");
                set.ignored += 1;
                continue;
            }

            set.insert(projector.project(item))?;
        }

        debug!(events = set.len(), ignored = set.ignored, "Built desired set");
        Ok(set)
    }

    /// Add a surrogate. An identical surrogate under the same id is a source
    /// duplicate and collapses into one; a different one is a collision.
    pub fn insert(&mut self, event: ProjectedEvent) -> SyncResult<()> {
        match self.events.entry(event.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(event);
                Ok(())
            }
            Entry::Occupied(existing) if *existing.get() == event => {
                warn!(id = %event.id, "Source returned a duplicate event, syncing it once");
                Ok(())
            }
            Entry::Occupied(existing) => Err(SyncError::IdCollision {
                id: event.id.clone(),
                existing: existing.get().time_range(),
                incoming: event.time_range(),
            }),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectedEvent> {
        self.events.values()
    }
}

impl TryFrom<Vec<ProjectedEvent>> for DesiredSet {
    type Error = SyncError;

    /// Same collision rules as [`DesiredSet::insert`].
    fn try_from(events: Vec<ProjectedEvent>) -> SyncResult<Self> {
        let mut set = DesiredSet::default();
        for event in events {
            set.insert(event)?;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CalendarRef;
    use crate::identity::IdentityInput;
    use crate::policy::{Policy, SubjectPattern};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    /// Deriver that maps every input to the same id.
    struct CollidingDeriver;

    impl IdDeriver for CollidingDeriver {
        fn derive(&self, _input: &IdentityInput<'_>) -> String {
            "0".repeat(64)
        }
    }

    fn calendar() -> CalendarRef {
        CalendarRef {
            url: "https://cloud.example.com/dav/calendars/me/work/".to_string(),
            name: "work".to_string(),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 17, hour, 0, 0).unwrap()
    }

    fn item(hour: u32, subject: &str) -> SourceEvent {
        SourceEvent::new(at(hour), at(hour) + Duration::hours(1), subject)
    }

    #[test]
    fn test_ignored_subject_never_reaches_desired_set() {
        let policy = Policy {
            ignore: Some(SubjectPattern::new("subject_ignore_re", "Canceled:").unwrap()),
            ..Policy::default()
        };
        let cal = calendar();
        let projector = Projector::new(&policy, &cal);
        let items = vec![item(9, "Canceled: Standup"), item(10, "Planning")];

        let set = DesiredSet::build(&items, &projector).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.ignored, 1);
        let kept = set.iter().next().unwrap();
        assert_eq!(kept.start, at(10));
        assert!(set.contains(&kept.id));
    }

    #[test]
    fn test_subjectless_items_are_kept_under_ignore_policy() {
        let policy = Policy {
            ignore: Some(SubjectPattern::new("subject_ignore_re", ".*").unwrap()),
            ..Policy::default()
        };
        let cal = calendar();
        let projector = Projector::new(&policy, &cal);
        let items = vec![SourceEvent {
            start: at(9),
            end: at(10),
            subject: None,
        }];

        let set = DesiredSet::build(&items, &projector).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().summary, "work appointment");
    }

    #[test]
    fn test_colliding_ids_raise_error() {
        let policy = Policy::default();
        let cal = calendar();
        let projector = Projector::with_deriver(&policy, &cal, CollidingDeriver);
        let items = vec![item(9, "One"), item(11, "Two")];

        let err = DesiredSet::build(&items, &projector).unwrap_err();

        match err {
            SyncError::IdCollision { id, existing, incoming } => {
                assert_eq!(id, "0".repeat(64));
                assert!(existing.starts_with("2025-03-17T09:00:00Z"));
                assert!(incoming.starts_with("2025-03-17T11:00:00Z"));
            }
            other => panic!("expected collision, got {other}"),
        }
    }

    #[test]
    fn test_try_from_rejects_differing_events_under_one_id() {
        let first = item(9, "One");
        let second = item(11, "Two");
        let projected = |event: &SourceEvent, summary: &str| ProjectedEvent {
            id: "x".to_string(),
            summary: summary.to_string(),
            description: String::new(),
            start: event.start,
            end: event.end,
        };

        let result = DesiredSet::try_from(vec![projected(&first, "one"), projected(&second, "two")]);

        assert!(matches!(result, Err(SyncError::IdCollision { id, .. }) if id == "x"));
    }

    #[test]
    fn test_try_from_collapses_identical_events() {
        let event = ProjectedEvent {
            id: "x".to_string(),
            summary: "work appointment".to_string(),
            description: String::new(),
            start: at(9),
            end: at(10),
        };

        let set = DesiredSet::try_from(vec![event.clone(), event]).unwrap();

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_identical_duplicates_collapse() {
        let policy = Policy::default();
        let cal = calendar();
        let projector = Projector::new(&policy, &cal);
        let items = vec![item(9, "Standup"), item(9, "Standup")];

        let set = DesiredSet::build(&items, &projector).unwrap();

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_distinct_events_get_distinct_ids() {
        let policy = Policy::default();
        let cal = calendar();
        let projector = Projector::new(&policy, &cal);
        let items = vec![item(9, "Standup"), item(9, "Other"), item(10, "Standup")];

        let set = DesiredSet::build(&items, &projector).unwrap();

        assert_eq!(set.len(), 3);
    }
}
