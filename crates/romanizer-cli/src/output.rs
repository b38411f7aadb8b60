//! Output renderers for events and reports.

use anyhow::anyhow;
use romanizer_api_models::PlaylistSummary;
use romanizer_client::{BulkReport, HydrationReport, JobReport, JobStatus, SessionPhase, SlotValue};
use romanizer_events::{Event, EventEnvelope, EventStream, JobOutcome, SlotStatus};
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json(value: &Value, pretty: bool) -> CliResult<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

/// Render one published event. JSON output emits every event as a single
/// line; table output only shows what a user would see on the page.
pub(crate) fn render_event(envelope: &EventEnvelope, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string(envelope)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => match &envelope.event {
            Event::Notification { level, message } => println!("[{level}] {message}"),
            Event::SlotSettled { kind, status, .. } => {
                println!("{kind}: {}", slot_status_to_str(*status));
            }
            Event::JobProgress {
                completed, total, ..
            } => println!("progress: {completed}/{total}"),
            Event::JobFinished { outcome, .. } => {
                println!("job finished: {}", job_outcome_to_str(*outcome));
            }
            Event::HydrationFinalized { .. }
            | Event::HydrationAborted { .. }
            | Event::SelectionChanged { .. }
            | Event::BulkApplied { .. } => {}
        },
    }
    Ok(())
}

/// Render every event already buffered on `stream`.
pub(crate) fn render_pending_events(stream: &mut EventStream, format: OutputFormat) -> CliResult<()> {
    for envelope in stream.drain() {
        render_event(&envelope, format)?;
    }
    Ok(())
}

pub(crate) fn render_hydration_report(report: &HydrationReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let slots: Vec<Value> = report
                .slots
                .iter()
                .map(|slot| {
                    json!({
                        "kind": slot.kind().as_str(),
                        "status": slot_status_to_str(slot.status()),
                        "value": slot_value_json(slot.value()),
                    })
                })
                .collect();
            print_json(
                &json!({
                    "track_id": report.track_id,
                    "phase": phase_to_str(report.phase),
                    "attempts": report.attempts,
                    "timed_out": report.timed_out,
                    "slots": slots,
                }),
                true,
            )?;
        }
        OutputFormat::Table => {
            println!("track: {}", report.track_id);
            println!("phase: {}", phase_to_str(report.phase));
            println!("attempts: {}", report.attempts);
            if report.timed_out {
                println!("timed out: yes");
            }
            println!("  {:<14} {:<8} content", "slot", "status");
            for slot in &report.slots {
                println!(
                    "  {:<14} {:<8} {}",
                    slot.kind().as_str(),
                    slot_status_to_str(slot.status()),
                    slot_value_summary(slot.value())
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_job_report(report: &JobReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(
            &json!({
                "job_id": report.job_id,
                "status": job_status_to_str(report.status),
                "completed": report.completed,
                "total_tasks": report.total_tasks,
                "percent": report.percent(),
            }),
            true,
        )?,
        OutputFormat::Table => {
            println!("job: {}", report.job_id);
            println!("status: {}", job_status_to_str(report.status));
            println!(
                "progress: {}/{} ({}%)",
                report.completed,
                report.total_tasks,
                report.percent()
            );
        }
    }
    Ok(())
}

pub(crate) fn render_playlists(playlists: &[PlaylistSummary], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(playlists)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("{:<24} {:>6} NAME", "ID", "TRACKS");
            for playlist in playlists {
                println!(
                    "{:<24} {:>6} {}",
                    playlist.id, playlist.total_tracks, playlist.name
                );
            }
        }
    }
    Ok(())
}

/// Only JSON output prints the report; in table mode the success
/// notification already said everything.
pub(crate) fn render_bulk_report(report: &BulkReport, format: OutputFormat) -> CliResult<()> {
    if format == OutputFormat::Json {
        print_json(
            &json!({
                "action": report.action,
                "count": report.count,
                "moved": report.moved,
                "added": report.added,
                "skipped": report.skipped,
                "message": report.message,
            }),
            true,
        )?;
    }
    Ok(())
}

/// Outcome line for commands whose result is not carried by a notification.
pub(crate) fn render_outcome(operation: &str, message: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(
            &json!({ "operation": operation, "message": message }),
            false,
        ),
        OutputFormat::Table => {
            println!("{message}");
            Ok(())
        }
    }
}

const fn slot_status_to_str(status: SlotStatus) -> &'static str {
    match status {
        SlotStatus::Pending => "pending",
        SlotStatus::Ready => "ready",
        SlotStatus::Failed => "failed",
    }
}

const fn phase_to_str(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "idle",
        SessionPhase::Polling => "polling",
        SessionPhase::Finalized => "finalized",
        SessionPhase::Aborted => "aborted",
        SessionPhase::Cancelled => "cancelled",
    }
}

const fn job_status_to_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Running => "running",
        JobStatus::Complete => "complete",
        JobStatus::Expired => "expired",
        JobStatus::Aborted => "aborted",
        JobStatus::Cancelled => "cancelled",
    }
}

const fn job_outcome_to_str(outcome: JobOutcome) -> &'static str {
    match outcome {
        JobOutcome::Complete => "complete",
        JobOutcome::Expired => "expired",
        JobOutcome::Aborted => "aborted",
    }
}

fn slot_value_json(value: &SlotValue) -> Value {
    match value {
        SlotValue::Placeholder => json!({ "type": "placeholder" }),
        SlotValue::Text(text) => json!({ "type": "text", "text": text }),
        SlotValue::Player { url, title } => json!({ "type": "player", "url": url, "title": title }),
        SlotValue::Hidden => json!({ "type": "hidden" }),
        SlotValue::Message(message) => json!({ "type": "message", "message": message }),
    }
}

fn slot_value_summary(value: &SlotValue) -> String {
    match value {
        SlotValue::Placeholder => "<loading>".to_string(),
        SlotValue::Text(text) => first_line(text),
        SlotValue::Player { url, .. } => url.clone(),
        SlotValue::Hidden => "<hidden>".to_string(),
        SlotValue::Message(message) => message.clone(),
    }
}

fn first_line(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().trim();
    if lines.next().is_some() {
        format!("{first} ...")
    } else {
        first.to_string()
    }
}
