//! Terminal rendering for sync reports.
//!
//! Extension traits that add colored output to blocksync-core types using
//! owo_colors.

use blocksync_core::reconcile::{ChangeKind, ReconcilePlan, ReconcileReport};
use blocksync_core::sync::{CalendarStatus, SyncReport};
use blocksync_core::{ProjectedEvent, RemoteEvent};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ChangeKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            ChangeKind::Create => symbol.green().to_string(),
            ChangeKind::Delete => symbol.red().to_string(),
        }
    }
}

impl Render for ProjectedEvent {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            ChangeKind::Create.render(),
            self.summary.green(),
            self.time_range().dimmed()
        )
    }
}

impl Render for RemoteEvent {
    fn render(&self) -> String {
        format!(
            "{} {}",
            ChangeKind::Delete.render(),
            self.to_string().red()
        )
    }
}

impl Render for CalendarStatus {
    fn render(&self) -> String {
        let calendar = self.calendar();
        match self {
            CalendarStatus::Existing(_) => format!("📅 {}", calendar.name),
            CalendarStatus::Created(_) => format!("📅 {} {}", calendar.name, "(created)".green()),
            CalendarStatus::Missing(_) => {
                format!("📅 {} {}", calendar.name, "(would create)".yellow())
            }
        }
    }
}

/// Threshold for compact view (show counts instead of individual events)
const COMPACT_THRESHOLD: usize = 5;

fn render_plan(plan: &ReconcilePlan, verbose: bool, lines: &mut Vec<String>) {
    if plan.is_empty() {
        lines.push("   No changes".dimmed().to_string());
        return;
    }

    if verbose || plan.change_count() <= COMPACT_THRESHOLD {
        for event in &plan.delete {
            lines.push(format!("   {}", event.render()));
        }
        for event in &plan.create {
            lines.push(format!("   {}", event.render()));
        }
        return;
    }

    let creates = plan.create.len();
    let deletes = plan.delete.len();

    if creates > 0 {
        let label = format!("({} new {})", creates, pluralize("block", creates));
        lines.push(format!("   {} {}", "+".green(), label.green()));
    }
    if deletes > 0 {
        let label = format!("({} stale {})", deletes, pluralize("block", deletes));
        lines.push(format!("   {} {}", "-".red(), label.red()));
    }
}

fn render_outcome(outcome: &ReconcileReport, lines: &mut Vec<String>) {
    for failure in &outcome.failures {
        let line = format!("   {} {} failed: {}", failure.kind.render(), failure.id, failure.cause);
        lines.push(line.red().to_string());
    }

    lines.push(String::new());
    lines.push(format!(
        "Created: {}, deleted: {}, kept: {}, failed: {}",
        outcome.created.len(),
        outcome.deleted.len(),
        outcome.kept.len(),
        outcome.failures.len()
    ));
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Rendering for a whole run, with the per-event list collapsed unless verbose.
pub trait ReportRender {
    fn render(&self, verbose: bool) -> String;
}

impl ReportRender for SyncReport {
    fn render(&self, verbose: bool) -> String {
        let mut lines = vec![
            self.calendar.render(),
            format!("   {}", self.window).dimmed().to_string(),
        ];

        if self.ignored > 0 {
            let note = format!(
                "   {} of {} source {} ignored",
                self.ignored,
                self.source_events,
                pluralize("event", self.source_events)
            );
            lines.push(note.dimmed().to_string());
        }

        render_plan(&self.plan, verbose, &mut lines);

        match &self.outcome {
            Some(outcome) => render_outcome(outcome, &mut lines),
            None => {
                lines.push(String::new());
                lines.push(format!(
                    "Would create: {}, delete: {}, keep: {}",
                    self.plan.create.len(),
                    self.plan.delete.len(),
                    self.plan.keep.len()
                ));
            }
        }

        lines.join("\n")
    }
}
