//! One sync run: fetch, project, plan, apply.

use tracing::info;

use crate::desired::DesiredSet;
use crate::error::SyncResult;
use crate::event::CalendarRef;
use crate::policy::Policy;
use crate::projection::Projector;
use crate::provider::{DestinationCalendar, SourceCalendar};
use crate::reconcile::{ReconcilePlan, ReconcileReport};
use crate::window::SyncWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Apply the plan to the destination calendar
    Apply,
    /// Compute the plan without mutating anything
    DryRun,
}

/// State of the destination calendar at the start of a run.
#[derive(Debug, Clone)]
pub enum CalendarStatus {
    Existing(CalendarRef),
    Created(CalendarRef),
    /// Missing, and not created because this is a dry run
    Missing(CalendarRef),
}

impl CalendarStatus {
    pub fn calendar(&self) -> &CalendarRef {
        match self {
            CalendarStatus::Existing(c) | CalendarStatus::Created(c) | CalendarStatus::Missing(c) => c,
        }
    }
}

/// Everything a run decided and did.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub window: SyncWindow,
    pub calendar: CalendarStatus,
    pub source_events: usize,
    pub ignored: usize,
    pub plan: ReconcilePlan,
    /// `None` for dry runs
    pub outcome: Option<ReconcileReport>,
}

/// Collaborators and policy for syncing into one named calendar.
pub struct SyncJob<'a, S: ?Sized, D: ?Sized> {
    pub source: &'a S,
    pub destination: &'a D,
    pub policy: &'a Policy,
    pub calendar_name: &'a str,
}

impl<S, D> SyncJob<'_, S, D>
where
    S: SourceCalendar + ?Sized,
    D: DestinationCalendar + ?Sized,
{
    /// Run once over `window`.
    ///
    /// Source, calendar lookup, collision and listing failures abort before
    /// any event is touched. Per-event failures are collected in the
    /// outcome instead.
    pub async fn run(&self, window: SyncWindow, mode: RunMode) -> SyncResult<SyncReport> {
        info!("Fetching source events for {window}");
        let items = self.source.list_events(&window).await?;
        info!(count = items.len(), "Fetched source events");

        let calendar = self.resolve_calendar(mode).await?;
        let projector = Projector::new(self.policy, calendar.calendar());
        let desired = DesiredSet::build(&items, &projector)?;

        let remote = match &calendar {
            CalendarStatus::Missing(_) => Vec::new(),
            CalendarStatus::Existing(cal) | CalendarStatus::Created(cal) => {
                info!("Listing events in {}", cal.name);
                self.destination.list_events(cal).await?
            }
        };

        let plan = ReconcilePlan::compute(&desired, remote);
        info!(
            keep = plan.keep.len(),
            delete = plan.delete.len(),
            create = plan.create.len(),
            "Planned changes"
        );

        let outcome = match mode {
            RunMode::DryRun => None,
            RunMode::Apply => Some(plan.apply(self.destination, calendar.calendar()).await),
        };

        Ok(SyncReport {
            window,
            calendar,
            source_events: items.len(),
            ignored: desired.ignored,
            plan,
            outcome,
        })
    }

    async fn resolve_calendar(&self, mode: RunMode) -> SyncResult<CalendarStatus> {
        if let Some(calendar) = self.destination.find_calendar(self.calendar_name).await? {
            return Ok(CalendarStatus::Existing(calendar));
        }

        match mode {
            RunMode::DryRun => Ok(CalendarStatus::Missing(
                self.destination.planned_calendar(self.calendar_name),
            )),
            RunMode::Apply => {
                info!("Creating calendar: {}", self.calendar_name);
                let calendar = self.destination.create_calendar(self.calendar_name).await?;
                Ok(CalendarStatus::Created(calendar))
            }
        }
    }
}
