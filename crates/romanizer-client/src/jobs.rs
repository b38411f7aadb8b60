//! Background job progress.
//!
//! Dispatching cache warm-up for a playlist returns a job id and a task
//! count. A [`JobProgressPoller`] then polls the job status endpoint, always
//! displaying the server's own completed count, until the count reaches the
//! total or the server reports that it no longer tracks the job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use romanizer_events::{Event, EventBus, JobOutcome, NotificationLevel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};

use crate::api::{JobStatusReply, RomanizerApi};
use crate::config::PrimingSettings;
use crate::error::{ClientError, ClientResult};
use crate::poll::{PollHandle, PollStep, PollTarget, TickOutcome, spawn_poll_loop};
use crate::ticker::{IntervalTicker, Ticker};

/// Published before the dispatch call.
pub const CHECKING_MESSAGE: &str = "Checking playlist for uncached tracks...";
/// Published when dispatch found nothing to do.
pub const ALREADY_CACHED_MESSAGE: &str = "All tracks in this playlist are already cached!";
/// Published once the job completes or expires.
pub const COMPLETE_MESSAGE: &str = "Playlist pre-loading complete!";
/// Published when a status read fails at the transport level.
pub const PROGRESS_ERROR_MESSAGE: &str = "Error checking progress. Please refresh to see status.";
/// Fallback used when a dispatch fails without a server message.
pub const DISPATCH_FAILED_MESSAGE: &str = "Failed to start priming process.";

/// Poller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Polling.
    Running,
    /// Server reported every task done.
    Complete,
    /// Server no longer tracks the job; treated as complete.
    Expired,
    /// A status read failed at the transport level; polling stopped.
    Aborted,
    /// Polling was stopped from outside.
    Cancelled,
}

impl JobStatus {
    /// Whether the poller stopped.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Snapshot of a poller, returned when polling stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// Job identifier.
    pub job_id: String,
    /// Tasks dispatched.
    pub total_tasks: u32,
    /// Latest server-reported completed count.
    pub completed: u32,
    /// Final status.
    pub status: JobStatus,
}

impl JobReport {
    /// Completion percentage, clamped to 0..=100.
    #[must_use]
    pub fn percent(&self) -> u8 {
        percent(self.completed, self.total_tasks)
    }
}

/// Per-job progress coordinator.
#[derive(Debug)]
pub struct JobProgressPoller {
    job_id: String,
    total_tasks: u32,
    completed: u32,
    status: JobStatus,
    interval: Duration,
    events: EventBus,
}

impl JobProgressPoller {
    /// Create a poller for `job_id`. Returns `None` when `total_tasks` is
    /// zero: there is nothing to track.
    #[must_use]
    pub fn new(
        job_id: impl Into<String>,
        total_tasks: u32,
        settings: PrimingSettings,
        events: EventBus,
    ) -> Option<Self> {
        if total_tasks == 0 {
            return None;
        }
        Some(Self {
            job_id: job_id.into(),
            total_tasks,
            completed: 0,
            status: JobStatus::Running,
            interval: settings.interval,
            events,
        })
    }

    /// Job identifier.
    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Tasks dispatched.
    #[must_use]
    pub const fn total_tasks(&self) -> u32 {
        self.total_tasks
    }

    /// Latest server-reported completed count.
    #[must_use]
    pub const fn completed(&self) -> u32 {
        self.completed
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Completion percentage, clamped to 0..=100.
    #[must_use]
    pub fn percent(&self) -> u8 {
        percent(self.completed, self.total_tasks)
    }

    /// Progress line shown under the progress bar.
    #[must_use]
    pub fn progress_label(&self) -> String {
        match self.status {
            JobStatus::Complete | JobStatus::Expired => {
                "All tasks complete! Translations may take a moment longer.".to_string()
            }
            JobStatus::Aborted => "Error checking status.".to_string(),
            JobStatus::Running | JobStatus::Cancelled => {
                format!("Loading... ({} / {})", self.completed, self.total_tasks)
            }
        }
    }

    /// Snapshot the poller.
    #[must_use]
    pub fn report(&self) -> JobReport {
        JobReport {
            job_id: self.job_id.clone(),
            total_tasks: self.total_tasks,
            completed: self.completed,
            status: self.status,
        }
    }

    /// Begin polling at the configured interval.
    pub fn start<A>(self, api: Arc<A>) -> PollHandle<JobReport>
    where
        A: RomanizerApi + ?Sized + 'static,
    {
        let ticker = IntervalTicker::new(self.interval);
        self.start_with(api, ticker)
    }

    /// Begin polling driven by `ticker`.
    pub fn start_with<A, K>(self, api: Arc<A>, ticker: K) -> PollHandle<JobReport>
    where
        A: RomanizerApi + ?Sized + 'static,
        K: Ticker + 'static,
    {
        let span = info_span!("job_progress", job_id = %self.job_id, total = self.total_tasks);
        let target = JobTarget { poller: self, api };
        span.in_scope(|| spawn_poll_loop(target, ticker, CancellationToken::new()))
    }

    /// Fetch the job status once and apply it.
    pub async fn tick<A>(&mut self, api: &A) -> TickOutcome
    where
        A: RomanizerApi + ?Sized,
    {
        if self.status.is_terminal() {
            return TickOutcome::Discarded;
        }
        let reply = api.priming_status(&self.job_id).await;
        self.apply_reply(reply)
    }

    /// Apply one status read. Reads after a terminal state are discarded.
    pub fn apply_reply(&mut self, reply: ClientResult<JobStatusReply>) -> TickOutcome {
        if self.status.is_terminal() {
            debug!(job_id = %self.job_id, status = ?self.status, "discarding job status after terminal state");
            return TickOutcome::Discarded;
        }

        match reply {
            Ok(JobStatusReply::Progress { completed }) => {
                self.record_progress(completed);
                if self.completed >= self.total_tasks {
                    self.finish(JobStatus::Complete);
                    TickOutcome::Finalized
                } else {
                    TickOutcome::Continue
                }
            }
            Ok(JobStatusReply::Absent) => {
                info!(job_id = %self.job_id, "job record gone; treating as complete");
                self.record_progress(self.total_tasks);
                self.finish(JobStatus::Expired);
                TickOutcome::Finalized
            }
            Ok(JobStatusReply::Unavailable { status }) => {
                debug!(job_id = %self.job_id, status, "job status unavailable; polling continues");
                TickOutcome::Continue
            }
            Err(err) => {
                warn!(
                    job_id = %self.job_id,
                    operation = err.operation(),
                    error = %err,
                    "job status read failed"
                );
                self.status = JobStatus::Aborted;
                self.events.publish(Event::JobFinished {
                    job_id: self.job_id.clone(),
                    outcome: JobOutcome::Aborted,
                });
                self.events.notify(NotificationLevel::Error, PROGRESS_ERROR_MESSAGE);
                TickOutcome::Aborted
            }
        }
    }

    /// Stop polling from outside without a notification.
    pub fn cancel(&mut self) {
        if !self.status.is_terminal() {
            debug!(job_id = %self.job_id, "job polling cancelled");
            self.status = JobStatus::Cancelled;
        }
    }

    fn record_progress(&mut self, completed: u32) {
        self.completed = completed;
        self.events.publish(Event::JobProgress {
            job_id: self.job_id.clone(),
            completed: self.completed,
            total: self.total_tasks,
        });
    }

    fn finish(&mut self, status: JobStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        let outcome = if status == JobStatus::Expired {
            JobOutcome::Expired
        } else {
            JobOutcome::Complete
        };
        info!(job_id = %self.job_id, completed = self.completed, ?outcome, "job finished");
        self.events.publish(Event::JobFinished {
            job_id: self.job_id.clone(),
            outcome,
        });
        self.events.notify(NotificationLevel::Success, COMPLETE_MESSAGE);
    }
}

fn percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = u64::from(completed) * 100 / u64::from(total);
    u8::try_from(ratio.min(100)).unwrap_or(100)
}

struct JobTarget<A: ?Sized> {
    poller: JobProgressPoller,
    api: Arc<A>,
}

#[async_trait]
impl<A> PollTarget for JobTarget<A>
where
    A: RomanizerApi + ?Sized + 'static,
{
    type Output = JobReport;

    async fn poll(&mut self, token: &CancellationToken) -> PollStep<JobReport> {
        let reply = self.api.priming_status(self.poller.job_id()).await;
        if token.is_cancelled() {
            debug!(job_id = %self.poller.job_id(), "dropping job status that landed after cancellation");
            return PollStep::Continue;
        }
        match self.poller.apply_reply(reply) {
            TickOutcome::Continue => PollStep::Continue,
            TickOutcome::Finalized | TickOutcome::Aborted | TickOutcome::Discarded => {
                PollStep::Done(self.poller.report())
            }
        }
    }

    fn interrupted(&mut self) -> JobReport {
        self.poller.cancel();
        self.poller.report()
    }
}

/// Result of [`dispatch_priming`].
#[derive(Debug)]
pub enum PrimingStart {
    /// Every track was already cached; no poller was created.
    AlreadyCached,
    /// Work was dispatched; the poller is ready to start.
    Started(JobProgressPoller),
}

/// Dispatch cache warm-up for `playlist_id` and build the poller for the
/// resulting job.
///
/// # Errors
///
/// Returns the transport or server error after publishing an error
/// notification.
pub async fn dispatch_priming<A>(
    api: &A,
    playlist_id: &str,
    settings: PrimingSettings,
    events: &EventBus,
) -> ClientResult<PrimingStart>
where
    A: RomanizerApi + ?Sized,
{
    const OPERATION: &str = "priming.dispatch";
    events.notify(NotificationLevel::Info, CHECKING_MESSAGE);

    let outcome = api.dispatch_priming(playlist_id).await.and_then(|response| {
        if response.success {
            Ok(response)
        } else {
            Err(ClientError::Server {
                operation: OPERATION,
                status: None,
                message: response.error.or(response.message),
            })
        }
    });
    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            warn!(playlist_id, error = %err, "priming dispatch failed");
            events.notify(
                NotificationLevel::Error,
                format!("Error: {}", err.user_message(DISPATCH_FAILED_MESSAGE)),
            );
            return Err(err);
        }
    };

    let job = match (response.job_id, response.tasks_dispatched) {
        (_, 0) => None,
        (Some(job_id), total) => JobProgressPoller::new(job_id, total, settings, events.clone()),
        (None, _) => {
            let err = ClientError::Server {
                operation: OPERATION,
                status: None,
                message: Some("dispatch response carried no job id".to_string()),
            };
            events.notify(
                NotificationLevel::Error,
                format!("Error: {}", err.user_message(DISPATCH_FAILED_MESSAGE)),
            );
            return Err(err);
        }
    };

    match job {
        None => {
            info!(playlist_id, "playlist already cached");
            events.notify(NotificationLevel::Success, ALREADY_CACHED_MESSAGE);
            Ok(PrimingStart::AlreadyCached)
        }
        Some(poller) => {
            info!(playlist_id, job_id = %poller.job_id(), total = poller.total_tasks(), "priming dispatched");
            events.notify(
                NotificationLevel::Info,
                format!(
                    "Pre-loading {} track(s). This may take a moment.",
                    poller.total_tasks()
                ),
            );
            Ok(PrimingStart::Started(poller))
        }
    }
}
