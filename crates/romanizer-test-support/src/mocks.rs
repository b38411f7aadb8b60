//! Scripted API fake and manually driven ticker.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use romanizer_api_models::{
    MutationResponse, PlaylistSummary, PrimeDispatchResponse, TrackStatusResponse,
};
use romanizer_client::{
    ClientError, ClientResult, JobStatusReply, MutationRequest, RomanizerApi, Ticker,
};
use tokio::sync::mpsc;

/// One call observed by [`ScriptedApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `track_status(track_id)`.
    TrackStatus(String),
    /// `priming_status(job_id)`.
    PrimingStatus(String),
    /// `dispatch_priming(playlist_id)`.
    DispatchPriming(String),
    /// `list_playlists()`.
    ListPlaylists,
    /// `submit_mutation(request)`.
    Mutation(MutationRequest),
}

#[derive(Default)]
struct Script {
    track_status: VecDeque<ClientResult<TrackStatusResponse>>,
    priming_status: VecDeque<ClientResult<JobStatusReply>>,
    dispatch: VecDeque<ClientResult<PrimeDispatchResponse>>,
    mutations: VecDeque<ClientResult<MutationResponse>>,
    playlists: Vec<PlaylistSummary>,
    calls: Vec<ApiCall>,
}

/// [`RomanizerApi`] answering from per-endpoint queues and recording calls.
///
/// An exhausted queue answers with a server error naming the operation, so a
/// test that polls more often than scripted fails loudly instead of hanging.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<Script>,
}

impl ScriptedApi {
    /// Create an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a track status answer.
    pub fn push_track_status(&self, reply: ClientResult<TrackStatusResponse>) -> &Self {
        self.lock().track_status.push_back(reply);
        self
    }

    /// Queue a job status answer.
    pub fn push_priming_status(&self, reply: ClientResult<JobStatusReply>) -> &Self {
        self.lock().priming_status.push_back(reply);
        self
    }

    /// Queue a priming dispatch answer.
    pub fn push_dispatch(&self, reply: ClientResult<PrimeDispatchResponse>) -> &Self {
        self.lock().dispatch.push_back(reply);
        self
    }

    /// Queue a mutation answer.
    pub fn push_mutation(&self, reply: ClientResult<MutationResponse>) -> &Self {
        self.lock().mutations.push_back(reply);
        self
    }

    /// Set the playlists returned by `list_playlists`.
    pub fn set_playlists(&self, playlists: Vec<PlaylistSummary>) -> &Self {
        self.lock().playlists = playlists;
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Mutation requests received so far, in order.
    #[must_use]
    pub fn mutations(&self) -> Vec<MutationRequest> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::Mutation(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of track status reads received.
    #[must_use]
    pub fn track_status_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, ApiCall::TrackStatus(_)))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn exhausted<T>(operation: &'static str) -> ClientResult<T> {
    Err(ClientError::Server {
        operation,
        status: None,
        message: Some(format!("no scripted response left for {operation}")),
    })
}

#[async_trait]
impl RomanizerApi for ScriptedApi {
    async fn track_status(&self, track_id: &str) -> ClientResult<TrackStatusResponse> {
        let mut script = self.lock();
        script.calls.push(ApiCall::TrackStatus(track_id.to_string()));
        script
            .track_status
            .pop_front()
            .unwrap_or_else(|| exhausted("track.status"))
    }

    async fn priming_status(&self, job_id: &str) -> ClientResult<JobStatusReply> {
        let mut script = self.lock();
        script.calls.push(ApiCall::PrimingStatus(job_id.to_string()));
        script
            .priming_status
            .pop_front()
            .unwrap_or_else(|| exhausted("priming.status"))
    }

    async fn dispatch_priming(&self, playlist_id: &str) -> ClientResult<PrimeDispatchResponse> {
        let mut script = self.lock();
        script
            .calls
            .push(ApiCall::DispatchPriming(playlist_id.to_string()));
        script
            .dispatch
            .pop_front()
            .unwrap_or_else(|| exhausted("priming.dispatch"))
    }

    async fn list_playlists(&self) -> ClientResult<Vec<PlaylistSummary>> {
        let mut script = self.lock();
        script.calls.push(ApiCall::ListPlaylists);
        Ok(script.playlists.clone())
    }

    async fn submit_mutation(&self, request: &MutationRequest) -> ClientResult<MutationResponse> {
        let mut script = self.lock();
        script.calls.push(ApiCall::Mutation(request.clone()));
        script
            .mutations
            .pop_front()
            .unwrap_or_else(|| exhausted(request.operation()))
    }
}

/// Ticker that fires only when its [`TickDriver`] says so.
#[derive(Debug)]
pub struct ManualTicker {
    ticks: mpsc::UnboundedReceiver<()>,
}

/// Sending half of a [`ManualTicker`]. Dropping it ends the ticker once the
/// queued ticks are consumed.
#[derive(Debug, Clone)]
pub struct TickDriver {
    ticks: mpsc::UnboundedSender<()>,
}

/// Create a connected driver and ticker.
#[must_use]
pub fn manual_ticker() -> (TickDriver, ManualTicker) {
    let (ticks, receiver) = mpsc::unbounded_channel();
    (TickDriver { ticks }, ManualTicker { ticks: receiver })
}

impl TickDriver {
    /// Queue one tick. Returns `false` when the ticker is gone.
    pub fn tick(&self) -> bool {
        self.ticks.send(()).is_ok()
    }

    /// Queue `count` ticks.
    pub fn ticks(&self, count: usize) {
        for _ in 0..count {
            if !self.tick() {
                break;
            }
        }
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.ticks.recv().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{accepted, ready_content, status_ok};

    #[tokio::test]
    async fn scripted_api_replays_queue_then_reports_exhaustion() {
        let api = ScriptedApi::new();
        api.push_track_status(Ok(status_ok(ready_content())));

        assert!(api.track_status("42").await.is_ok());
        let err = api.track_status("42").await.expect_err("queue exhausted");
        assert_eq!(err.operation(), "track.status");
        assert_eq!(api.track_status_calls(), 2);
    }

    #[tokio::test]
    async fn mutations_are_recorded_in_order() {
        let api = ScriptedApi::new();
        api.push_mutation(Ok(accepted()));
        let request = MutationRequest::DeletePlaylist(romanizer_api_models::PlaylistDeleteRequest {
            playlist_id: "pl".to_string(),
        });
        let response = api.submit_mutation(&request).await.expect("scripted");
        assert!(response.success);
        assert_eq!(api.mutations(), vec![request]);
    }

    #[tokio::test]
    async fn manual_ticker_ends_when_driver_drops() {
        let (driver, mut ticker) = manual_ticker();
        driver.ticks(2);
        drop(driver);
        assert!(ticker.tick().await);
        assert!(ticker.tick().await);
        assert!(!ticker.tick().await);
    }
}
