use anyhow::anyhow;
use romanizer_api_models::TrackStatusKind;
use romanizer_client::{HydrationSession, HydrationStart, PendingFlags, RomanizerApi, SessionPhase};

use crate::cli::{OutputFormat, TrackWatchArgs};
use crate::client::{AppContext, CliError, CliResult, client_failure};
use crate::commands::follow;
use crate::output::{render_hydration_report, render_pending_events};

pub(crate) async fn handle_track_watch(
    ctx: &AppContext,
    args: TrackWatchArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let track_id = args.track_id.trim();
    if track_id.is_empty() {
        return Err(CliError::validation("track id must not be empty"));
    }

    // The first read stands in for the server-rendered page.
    let first = ctx.api.track_status(track_id).await.map_err(client_failure)?;
    if first.status == TrackStatusKind::Error {
        let message = first
            .message
            .unwrap_or_else(|| "track status reported an error".to_string());
        return Err(CliError::failure(anyhow!(message)));
    }
    let content = first
        .data
        .ok_or_else(|| CliError::failure(anyhow!("track status carried no content")))?;

    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let session = HydrationSession::new(
        track_id,
        PendingFlags::from_content(&content),
        &content,
        ctx.config.hydration,
        ctx.events.clone(),
    );
    let report = match session.start(ctx.api.clone()) {
        HydrationStart::Settled(report) => report,
        HydrationStart::Polling(handle) => follow(handle, &mut stream, format).await?,
    };
    render_pending_events(&mut stream, format)?;
    render_hydration_report(&report, format)?;

    if report.phase == SessionPhase::Aborted {
        return Err(CliError::failure(anyhow!(
            "track status polling failed after {} attempt(s)",
            report.attempts
        )));
    }
    Ok(())
}
