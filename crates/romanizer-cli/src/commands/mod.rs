//! Command handlers grouped by the page they drive.

pub(crate) mod library;
pub(crate) mod playlist;
pub(crate) mod prime;
pub(crate) mod track;

use anyhow::anyhow;
use romanizer_client::PollHandle;
use romanizer_events::EventStream;
use tracing::info;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};
use crate::output::{render_event, render_pending_events};

/// Print events as they are published until the poll loop behind `handle`
/// stops, then return its report. Ctrl-C cancels the loop; the interrupted
/// report is still returned.
pub(crate) async fn follow<T>(
    handle: PollHandle<T>,
    stream: &mut EventStream,
    format: OutputFormat,
) -> CliResult<T> {
    let token = handle.token().clone();
    let mut watch_interrupt = true;
    let completed = handle.completed();
    tokio::pin!(completed);

    loop {
        tokio::select! {
            report = &mut completed => {
                render_pending_events(stream, format)?;
                return report.ok_or_else(|| CliError::failure(anyhow!("poll loop stopped unexpectedly")));
            }
            Some(envelope) = stream.next() => render_event(&envelope, format)?,
            result = tokio::signal::ctrl_c(), if watch_interrupt => {
                watch_interrupt = false;
                if result.is_ok() {
                    info!("interrupted; cancelling poll loop");
                    token.cancel();
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn context_with(server: &httpmock::MockServer) -> crate::client::AppContext {
    use std::time::Duration;

    use romanizer_client::{ClientConfig, HydrationSettings, PrimingSettings};

    let base = server.base_url().parse().expect("mock server url");
    let mut config = ClientConfig::new(base);
    config.hydration = HydrationSettings {
        interval: Duration::from_millis(5),
        max_attempts: 2,
    };
    config.priming = PrimingSettings {
        interval: Duration::from_millis(5),
    };
    crate::client::AppContext::new(config).expect("context builds")
}
