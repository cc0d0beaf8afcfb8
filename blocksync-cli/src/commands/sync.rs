use anyhow::{Context, Result};
use blocksync_core::settings::Settings;
use blocksync_core::sync::{RunMode, SyncJob};
use blocksync_core::window::SyncWindow;
use blocksync_provider_caldav::CalDavDestination;
use blocksync_provider_ews::EwsSource;
use chrono::Utc;

use crate::render::ReportRender;

pub async fn run(settings: &Settings, mode: RunMode, verbose: bool) -> Result<()> {
    let source = EwsSource::new(
        &settings.source.host,
        &settings.source.username,
        &settings.source.password,
    )?;
    let destination = CalDavDestination::new(
        &settings.destination.url,
        &settings.destination.username,
        &settings.destination.password,
    )?;

    let window = SyncWindow::current_week(Utc::now(), settings.timezone, settings.sync_days)?;

    let job = SyncJob {
        source: &source,
        destination: &destination,
        policy: &settings.policy,
        calendar_name: &settings.destination.calendar_name,
    };

    let report = job.run(window, mode).await.context("Sync failed")?;

    println!("{}", report.render(verbose));

    // Per-event failures were already printed; they still fail the run
    if let Some(outcome) = report.outcome {
        outcome.into_result()?;
    }

    Ok(())
}
