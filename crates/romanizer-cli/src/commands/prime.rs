use anyhow::anyhow;
use romanizer_client::{JobStatus, PrimingStart, dispatch_priming};

use crate::cli::{OutputFormat, PrimeArgs};
use crate::client::{AppContext, CliError, CliResult, client_failure};
use crate::commands::follow;
use crate::output::{render_job_report, render_pending_events};

pub(crate) async fn handle_prime(
    ctx: &AppContext,
    args: PrimeArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let playlist_id = args.playlist_id.trim();
    if playlist_id.is_empty() {
        return Err(CliError::validation("playlist id must not be empty"));
    }

    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let started = dispatch_priming(ctx.api.as_ref(), playlist_id, ctx.config.priming, &ctx.events).await;
    render_pending_events(&mut stream, format)?;
    let poller = match started.map_err(client_failure)? {
        PrimingStart::AlreadyCached => return Ok(()),
        PrimingStart::Started(poller) => poller,
    };

    let report = follow(poller.start(ctx.api.clone()), &mut stream, format).await?;
    render_job_report(&report, format)?;
    match report.status {
        JobStatus::Aborted => Err(CliError::failure(anyhow!(
            "progress polling for job {} failed",
            report.job_id
        ))),
        JobStatus::Cancelled => Err(CliError::failure(anyhow!(
            "progress polling for job {} was cancelled at {}/{}",
            report.job_id,
            report.completed,
            report.total_tasks
        ))),
        JobStatus::Running | JobStatus::Complete | JobStatus::Expired => Ok(()),
    }
}
