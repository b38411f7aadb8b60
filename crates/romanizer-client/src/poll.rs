//! Cancellable repeating task.
//!
//! A poll loop waits on a [`Ticker`], calls its [`PollTarget`] once per tick
//! and stops when the target reports completion, the ticker runs dry or the
//! [`CancellationToken`] fires. The token is the single "is this still live"
//! flag: targets re-check it after every awaited response so a reply that
//! lands after cancellation is dropped instead of applied.

use async_trait::async_trait;
use romanizer_telemetry::{current_request_id, with_request_id};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug};

use crate::ticker::Ticker;

/// Effect of applying one status read to a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Work remains; poll again on the next tick.
    Continue,
    /// This read finalized the coordinator.
    Finalized,
    /// This read failed and stopped the coordinator.
    Aborted,
    /// The coordinator was already terminal; the read was ignored.
    Discarded,
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    /// Keep polling on the next tick.
    Continue,
    /// Stop polling and resolve the handle with this report.
    Done(T),
}

/// Work performed once per tick.
#[async_trait]
pub trait PollTarget: Send {
    /// Final report produced when the loop stops.
    type Output: Send + 'static;

    /// Perform one poll. Implementations must check `token` after every
    /// await point and leave state untouched when it has fired.
    async fn poll(&mut self, token: &CancellationToken) -> PollStep<Self::Output>;

    /// Produce the report for a loop that stopped before the target finished.
    fn interrupted(&mut self) -> Self::Output;
}

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct PollHandle<T> {
    token: CancellationToken,
    task: JoinHandle<T>,
}

impl<T> PollHandle<T> {
    /// Stop the loop. A poll already in flight finishes but its response is
    /// discarded.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the loop has been told to stop, either by [`Self::cancel`] or
    /// because it finished.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the loop task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Token shared with the loop.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Wait for the loop to stop and return its report. Returns `None` if the
    /// loop task panicked.
    pub async fn completed(self) -> Option<T> {
        match self.task.await {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::error!(error = %err, "poll loop task failed");
                None
            }
        }
    }
}

/// Spawn a poll loop on the current runtime, instrumented with the caller's
/// current span and carrying the caller's request id.
pub fn spawn_poll_loop<P, K>(mut target: P, mut ticker: K, token: CancellationToken) -> PollHandle<P::Output>
where
    P: PollTarget + 'static,
    K: Ticker + 'static,
{
    let loop_token = token.clone();
    let request_id = current_request_id();
    let run = async move {
        loop {
            tokio::select! {
                biased;
                () = loop_token.cancelled() => {
                    debug!("poll loop cancelled");
                    return target.interrupted();
                }
                alive = ticker.tick() => {
                    if !alive {
                        debug!("ticker exhausted");
                        loop_token.cancel();
                        return target.interrupted();
                    }
                }
            }

            if let PollStep::Done(report) = target.poll(&loop_token).await {
                loop_token.cancel();
                return report;
            }
        }
    }
    .instrument(Span::current());
    let task = tokio::spawn(async move {
        match request_id {
            Some(id) => with_request_id(id, run).await,
            None => run.await,
        }
    });
    PollHandle { token, task }
}
