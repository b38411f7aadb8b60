//! Track page hydration.
//!
//! A [`HydrationSession`] owns the content slots of one track page. Slots the
//! server already rendered start settled; the rest are filled in by polling
//! the track status endpoint until every slot settles or the attempt budget
//! runs out. The session finalizes exactly once.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use romanizer_api_models::{TrackContent, TrackStatusKind, TrackStatusResponse};
use romanizer_events::{ContentKind, Event, EventBus, NotificationLevel, SlotStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};

use crate::api::RomanizerApi;
use crate::config::HydrationSettings;
use crate::content::{Readiness, assess};
use crate::error::ClientResult;
use crate::poll::{PollHandle, PollStep, PollTarget, TickOutcome, spawn_poll_loop};
use crate::ticker::{IntervalTicker, Ticker};

/// Text shown in the lyrics panes when they never arrived.
pub const LYRICS_TIMEOUT_MESSAGE: &str = "Content failed to load. Please try refreshing.";
/// Text shown in the translation pane when it never arrived.
pub const TRANSLATION_TIMEOUT_MESSAGE: &str = "Translation timed out.";
/// Text shown in place of the player when no video was found in time.
pub const VIDEO_TIMEOUT_MESSAGE: &str = "Video timed out.";
/// Notification published once the page stops changing.
pub const FINALIZED_MESSAGE: &str = "Page content finalized.";

/// Which slots the server rendered as still loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingFlags {
    /// Original and romanized lyrics are still loading.
    pub lyrics: bool,
    /// The translation is still loading.
    pub translation: bool,
    /// No video has been matched yet.
    pub video: bool,
}

impl PendingFlags {
    /// Whether any slot starts pending.
    #[must_use]
    pub const fn any(self) -> bool {
        self.lyrics || self.translation || self.video
    }

    /// Derive flags from a content snapshot, as the server does when it
    /// renders the page.
    #[must_use]
    pub fn from_content(content: &TrackContent) -> Self {
        Self {
            lyrics: assess(ContentKind::Lyrics, content) == Readiness::Pending,
            translation: assess(ContentKind::Translation, content) == Readiness::Pending,
            video: assess(ContentKind::Video, content) == Readiness::Pending,
        }
    }

    const fn is_pending(self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Lyrics | ContentKind::Romanization => self.lyrics,
            ContentKind::Translation => self.translation,
            ContentKind::Video => self.video,
        }
    }
}

/// What a slot currently displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValue {
    /// Loading skeleton.
    Placeholder,
    /// Rendered text.
    Text(String),
    /// Embedded player.
    Player {
        /// Embed URL.
        url: String,
        /// Song title used for the player caption.
        title: Option<String>,
    },
    /// Settled without content; the pane is hidden.
    Hidden,
    /// Explanatory message shown after a timeout.
    Message(String),
}

/// One independently completing piece of page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSlot {
    kind: ContentKind,
    status: SlotStatus,
    value: SlotValue,
}

impl ContentSlot {
    /// Slot kind.
    #[must_use]
    pub const fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    /// Current displayed value.
    #[must_use]
    pub const fn value(&self) -> &SlotValue {
        &self.value
    }

    /// Whether the slot has left the pending state.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.status.is_settled()
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Constructed, not polling.
    Idle,
    /// Polling the status endpoint.
    Polling,
    /// Every slot settled (possibly by timeout).
    Finalized,
    /// A status read failed; polling stopped with slots left as they were.
    Aborted,
    /// Polling was stopped from outside.
    Cancelled,
}

impl SessionPhase {
    /// Whether no further status will be applied.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Aborted | Self::Cancelled)
    }
}

/// Snapshot of a session, returned when polling stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationReport {
    /// Track the session belonged to.
    pub track_id: String,
    /// Phase at the time of the snapshot.
    pub phase: SessionPhase,
    /// Status reads applied.
    pub attempts: u32,
    /// Whether pending slots were failed by the attempt budget.
    pub timed_out: bool,
    /// Slots in display order.
    pub slots: Vec<ContentSlot>,
}

/// Result of [`HydrationSession::start`].
#[derive(Debug)]
pub enum HydrationStart {
    /// Nothing was pending; no timer was created.
    Settled(HydrationReport),
    /// Polling is running.
    Polling(PollHandle<HydrationReport>),
}

/// Per-page coordinator for pending track content.
#[derive(Debug)]
pub struct HydrationSession {
    track_id: String,
    slots: BTreeMap<ContentKind, ContentSlot>,
    attempt: u32,
    max_attempts: u32,
    interval: Duration,
    phase: SessionPhase,
    finalized: bool,
    timed_out: bool,
    events: EventBus,
}

impl HydrationSession {
    /// Build the session for `track_id`. Slots not flagged pending are ready
    /// immediately with the value taken from `rendered`.
    #[must_use]
    pub fn new(
        track_id: impl Into<String>,
        flags: PendingFlags,
        rendered: &TrackContent,
        settings: HydrationSettings,
        events: EventBus,
    ) -> Self {
        let slots = ContentKind::ALL
            .into_iter()
            .map(|kind| {
                let slot = if flags.is_pending(kind) {
                    ContentSlot {
                        kind,
                        status: SlotStatus::Pending,
                        value: SlotValue::Placeholder,
                    }
                } else if assess(kind, rendered) == Readiness::Failed {
                    ContentSlot {
                        kind,
                        status: SlotStatus::Failed,
                        value: SlotValue::Hidden,
                    }
                } else {
                    ContentSlot {
                        kind,
                        status: SlotStatus::Ready,
                        value: value_for(kind, rendered),
                    }
                };
                (kind, slot)
            })
            .collect();

        Self {
            track_id: track_id.into(),
            slots,
            attempt: 0,
            max_attempts: settings.max_attempts,
            interval: settings.interval,
            phase: SessionPhase::Idle,
            finalized: false,
            timed_out: false,
            events,
        }
    }

    /// Track this session hydrates.
    #[must_use]
    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    /// Status reads applied so far.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether finalization has happened.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Look up one slot.
    #[must_use]
    pub fn slot(&self, kind: ContentKind) -> Option<&ContentSlot> {
        self.slots.get(&kind)
    }

    /// Whether every slot has settled.
    #[must_use]
    pub fn all_settled(&self) -> bool {
        self.slots.values().all(ContentSlot::is_settled)
    }

    /// Snapshot the session.
    #[must_use]
    pub fn report(&self) -> HydrationReport {
        HydrationReport {
            track_id: self.track_id.clone(),
            phase: self.phase,
            attempts: self.attempt,
            timed_out: self.timed_out,
            slots: self.slots.values().cloned().collect(),
        }
    }

    /// Begin polling at the configured interval. No timer is created when
    /// every slot is already settled.
    pub fn start<A>(self, api: Arc<A>) -> HydrationStart
    where
        A: RomanizerApi + ?Sized + 'static,
    {
        let ticker = IntervalTicker::new(self.interval);
        self.start_with(api, ticker)
    }

    /// Begin polling driven by `ticker`.
    pub fn start_with<A, K>(mut self, api: Arc<A>, ticker: K) -> HydrationStart
    where
        A: RomanizerApi + ?Sized + 'static,
        K: Ticker + 'static,
    {
        if self.all_settled() {
            debug!(track_id = %self.track_id, "all slots rendered; not polling");
            return HydrationStart::Settled(self.report());
        }

        self.phase = SessionPhase::Polling;
        let span = info_span!("hydration", track_id = %self.track_id);
        let target = HydrationTarget { session: self, api };
        let handle = span.in_scope(|| spawn_poll_loop(target, ticker, CancellationToken::new()));
        HydrationStart::Polling(handle)
    }

    /// Fetch the track status once and apply it.
    pub async fn tick<A>(&mut self, api: &A) -> TickOutcome
    where
        A: RomanizerApi + ?Sized,
    {
        if self.phase.is_terminal() {
            return TickOutcome::Discarded;
        }
        let result = api.track_status(&self.track_id).await;
        self.apply_status(result)
    }

    /// Apply one status read. Reads arriving after a terminal state are
    /// discarded without touching any slot or counter.
    pub fn apply_status(&mut self, result: ClientResult<TrackStatusResponse>) -> TickOutcome {
        if self.finalized || self.phase.is_terminal() {
            debug!(
                track_id = %self.track_id,
                phase = ?self.phase,
                "discarding status read after terminal state"
            );
            return TickOutcome::Discarded;
        }

        self.phase = SessionPhase::Polling;
        self.attempt = self.attempt.saturating_add(1);

        let data = match result {
            Ok(TrackStatusResponse {
                status: TrackStatusKind::Error,
                message,
                ..
            }) => {
                return self.abort(message.as_deref().unwrap_or("status reported error"));
            }
            Ok(TrackStatusResponse {
                data: Some(data), ..
            }) => data,
            Ok(_) => return self.abort("status response carried no content"),
            Err(err) => {
                warn!(
                    track_id = %self.track_id,
                    attempt = self.attempt,
                    operation = err.operation(),
                    error = %err,
                    "track status read failed"
                );
                return self.abort("status read failed");
            }
        };

        for kind in ContentKind::ALL {
            if self.slots.get(&kind).is_some_and(ContentSlot::is_settled) {
                continue;
            }
            match assess(kind, &data) {
                Readiness::Pending => {}
                Readiness::Ready => self.settle(kind, SlotStatus::Ready, value_for(kind, &data)),
                Readiness::Failed => self.settle(kind, SlotStatus::Failed, SlotValue::Hidden),
            }
        }

        if self.all_settled() {
            self.finalize();
            return TickOutcome::Finalized;
        }

        if self.attempt >= self.max_attempts {
            info!(
                track_id = %self.track_id,
                attempt = self.attempt,
                "attempt budget exhausted; timing out pending slots"
            );
            self.timed_out = true;
            for kind in ContentKind::ALL {
                if self.slots.get(&kind).is_some_and(|slot| !slot.is_settled()) {
                    let message = timeout_message(kind).to_string();
                    self.settle(kind, SlotStatus::Failed, SlotValue::Message(message));
                }
            }
            self.finalize();
            return TickOutcome::Finalized;
        }

        debug!(track_id = %self.track_id, attempt = self.attempt, "slots still pending");
        TickOutcome::Continue
    }

    /// Stop the session from outside. Settled slots are kept; no notification
    /// is published.
    pub fn cancel(&mut self) {
        if !self.phase.is_terminal() {
            debug!(track_id = %self.track_id, "hydration cancelled");
            self.phase = SessionPhase::Cancelled;
        }
    }

    fn settle(&mut self, kind: ContentKind, status: SlotStatus, value: SlotValue) {
        let Some(slot) = self.slots.get_mut(&kind) else {
            return;
        };
        if slot.is_settled() {
            return;
        }
        slot.status = status;
        slot.value = value;
        debug!(track_id = %self.track_id, kind = %kind, status = ?status, "slot settled");
        self.events.publish(Event::SlotSettled {
            track_id: self.track_id.clone(),
            kind,
            status,
        });
    }

    fn abort(&mut self, reason: &str) -> TickOutcome {
        warn!(
            track_id = %self.track_id,
            attempt = self.attempt,
            reason,
            "hydration aborted"
        );
        self.phase = SessionPhase::Aborted;
        self.events.publish(Event::HydrationAborted {
            track_id: self.track_id.clone(),
            attempt: self.attempt,
        });
        TickOutcome::Aborted
    }

    fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        self.phase = SessionPhase::Finalized;
        info!(
            track_id = %self.track_id,
            attempts = self.attempt,
            timed_out = self.timed_out,
            "page content finalized"
        );
        self.events.publish(Event::HydrationFinalized {
            track_id: self.track_id.clone(),
            attempts: self.attempt,
            timed_out: self.timed_out,
        });
        self.events.notify(NotificationLevel::Info, FINALIZED_MESSAGE);
    }
}

const fn timeout_message(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Lyrics | ContentKind::Romanization => LYRICS_TIMEOUT_MESSAGE,
        ContentKind::Translation => TRANSLATION_TIMEOUT_MESSAGE,
        ContentKind::Video => VIDEO_TIMEOUT_MESSAGE,
    }
}

fn value_for(kind: ContentKind, content: &TrackContent) -> SlotValue {
    match kind {
        ContentKind::Lyrics => SlotValue::Text(content.original_lyrics.clone()),
        ContentKind::Romanization => SlotValue::Text(content.romanized_lyrics.clone()),
        ContentKind::Translation => SlotValue::Text(content.translated_lyrics.clone()),
        ContentKind::Video => match content.youtube_url.as_deref() {
            Some(url) if !url.trim().is_empty() => SlotValue::Player {
                url: url.to_string(),
                title: content.song_title.clone(),
            },
            _ => SlotValue::Hidden,
        },
    }
}

struct HydrationTarget<A: ?Sized> {
    session: HydrationSession,
    api: Arc<A>,
}

#[async_trait]
impl<A> PollTarget for HydrationTarget<A>
where
    A: RomanizerApi + ?Sized + 'static,
{
    type Output = HydrationReport;

    async fn poll(&mut self, token: &CancellationToken) -> PollStep<HydrationReport> {
        let result = self.api.track_status(self.session.track_id()).await;
        if token.is_cancelled() {
            debug!(track_id = %self.session.track_id(), "dropping status read that landed after cancellation");
            return PollStep::Continue;
        }
        match self.session.apply_status(result) {
            TickOutcome::Continue => PollStep::Continue,
            TickOutcome::Finalized | TickOutcome::Aborted | TickOutcome::Discarded => {
                PollStep::Done(self.session.report())
            }
        }
    }

    fn interrupted(&mut self) -> HydrationReport {
        self.session.cancel();
        self.session.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use romanizer_events::EventEnvelope;
    use std::io;

    fn content(original: &str, translated: &str, video: Option<&str>) -> TrackContent {
        TrackContent {
            original_lyrics: original.to_string(),
            romanized_lyrics: format!("{original} (romanized)"),
            translated_lyrics: translated.to_string(),
            youtube_url: video.map(str::to_string),
            song_title: Some("Idol".to_string()),
        }
    }

    fn pending(data: TrackContent) -> ClientResult<TrackStatusResponse> {
        Ok(TrackStatusResponse {
            status: TrackStatusKind::Pending,
            data: Some(data),
            message: None,
        })
    }

    fn settings(max_attempts: u32) -> HydrationSettings {
        HydrationSettings {
            interval: Duration::from_millis(10),
            max_attempts,
        }
    }

    fn notifications(events: &[EventEnvelope]) -> Vec<(NotificationLevel, String)> {
        events
            .iter()
            .filter_map(|envelope| match &envelope.event {
                Event::Notification { level, message } => Some((*level, message.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn unflagged_slots_start_ready_with_rendered_values() {
        let rendered = content("歌詞", "Lyrics", Some("https://youtube.com/embed/x"));
        let session = HydrationSession::new(
            "1",
            PendingFlags::default(),
            &rendered,
            settings(30),
            EventBus::new(),
        );
        assert!(session.all_settled());
        assert_eq!(
            session.slot(ContentKind::Romanization).map(ContentSlot::value),
            Some(&SlotValue::Text("歌詞 (romanized)".to_string()))
        );
        assert!(matches!(
            session.slot(ContentKind::Video).map(ContentSlot::value),
            Some(SlotValue::Player { .. })
        ));
    }

    #[test]
    fn lyrics_settle_on_second_read_and_finalize_once() {
        let events = EventBus::new();
        let mut stream = events.subscribe(None);
        let loading = content("Loading lyrics...", "Done", Some("u"));
        let flags = PendingFlags {
            lyrics: true,
            ..PendingFlags::default()
        };
        let mut session = HydrationSession::new("42", flags, &loading, settings(30), events);

        assert_eq!(session.apply_status(pending(loading.clone())), TickOutcome::Continue);
        assert_eq!(
            session.slot(ContentKind::Lyrics).map(ContentSlot::status),
            Some(SlotStatus::Pending)
        );

        let ready = content("本物の歌詞", "Done", Some("u"));
        assert_eq!(session.apply_status(pending(ready.clone())), TickOutcome::Finalized);
        assert_eq!(
            session.slot(ContentKind::Lyrics).map(ContentSlot::value),
            Some(&SlotValue::Text("本物の歌詞".to_string()))
        );
        assert_eq!(
            session.slot(ContentKind::Romanization).map(ContentSlot::status),
            Some(SlotStatus::Ready)
        );

        assert_eq!(session.apply_status(pending(ready)), TickOutcome::Discarded);
        assert_eq!(session.attempt(), 2);

        let drained = stream.drain();
        assert_eq!(
            notifications(&drained),
            vec![(NotificationLevel::Info, FINALIZED_MESSAGE.to_string())]
        );
        let finalized = drained
            .iter()
            .filter(|envelope| matches!(envelope.event, Event::HydrationFinalized { .. }))
            .count();
        assert_eq!(finalized, 1);
    }

    #[test]
    fn ready_slot_never_reverts() {
        let flags = PendingFlags {
            lyrics: true,
            video: true,
            ..PendingFlags::default()
        };
        let mut session = HydrationSession::new(
            "9",
            flags,
            &TrackContent::default(),
            settings(30),
            EventBus::new(),
        );
        assert_eq!(
            session.apply_status(pending(content("words", "", None))),
            TickOutcome::Continue
        );
        assert_eq!(
            session.apply_status(pending(content("Loading lyrics...", "", None))),
            TickOutcome::Continue
        );
        assert_eq!(
            session.slot(ContentKind::Lyrics).map(ContentSlot::value),
            Some(&SlotValue::Text("words".to_string()))
        );
    }

    #[test]
    fn translation_failure_marker_hides_pane_but_settles() {
        let flags = PendingFlags {
            translation: true,
            ..PendingFlags::default()
        };
        let mut session = HydrationSession::new(
            "5",
            flags,
            &TrackContent::default(),
            settings(30),
            EventBus::new(),
        );
        let outcome = session.apply_status(pending(content("x", "Translation not available.", None)));
        assert_eq!(outcome, TickOutcome::Finalized);
        let slot = session.slot(ContentKind::Translation).expect("slot");
        assert_eq!(slot.status(), SlotStatus::Failed);
        assert_eq!(slot.value(), &SlotValue::Hidden);
    }

    #[test]
    fn budget_exhaustion_times_out_pending_slots() {
        let events = EventBus::new();
        let mut stream = events.subscribe(None);
        let flags = PendingFlags {
            lyrics: true,
            translation: true,
            video: true,
        };
        let mut session =
            HydrationSession::new("7", flags, &TrackContent::default(), settings(3), events);
        let still_loading = content("Loading lyrics...", "Translation in progress", None);

        assert_eq!(session.apply_status(pending(still_loading.clone())), TickOutcome::Continue);
        assert_eq!(session.apply_status(pending(still_loading.clone())), TickOutcome::Continue);
        assert_eq!(session.apply_status(pending(still_loading.clone())), TickOutcome::Finalized);
        assert_eq!(session.attempt(), 3);
        assert_eq!(session.apply_status(pending(still_loading)), TickOutcome::Discarded);
        assert_eq!(session.attempt(), 3);

        let report = session.report();
        assert!(report.timed_out);
        assert_eq!(report.phase, SessionPhase::Finalized);
        assert_eq!(
            session.slot(ContentKind::Lyrics).map(ContentSlot::value),
            Some(&SlotValue::Message(LYRICS_TIMEOUT_MESSAGE.to_string()))
        );
        assert_eq!(
            session.slot(ContentKind::Translation).map(ContentSlot::value),
            Some(&SlotValue::Message(TRANSLATION_TIMEOUT_MESSAGE.to_string()))
        );
        assert_eq!(
            session.slot(ContentKind::Video).map(ContentSlot::value),
            Some(&SlotValue::Message(VIDEO_TIMEOUT_MESSAGE.to_string()))
        );
        assert_eq!(notifications(&stream.drain()).len(), 1);
    }

    #[test]
    fn failed_read_aborts_without_notification() {
        let events = EventBus::new();
        let mut stream = events.subscribe(None);
        let flags = PendingFlags {
            video: true,
            ..PendingFlags::default()
        };
        let mut session =
            HydrationSession::new("3", flags, &TrackContent::default(), settings(30), events);

        let outcome =
            session.apply_status(Err(ClientError::transport("track.status", io::Error::other("reset"))));
        assert_eq!(outcome, TickOutcome::Aborted);
        assert_eq!(session.phase(), SessionPhase::Aborted);
        assert!(!session.is_finalized());
        assert_eq!(
            session.slot(ContentKind::Video).map(ContentSlot::status),
            Some(SlotStatus::Pending)
        );
        assert_eq!(
            session.apply_status(pending(content("x", "y", Some("u")))),
            TickOutcome::Discarded
        );

        let drained = stream.drain();
        assert!(notifications(&drained).is_empty());
        assert!(
            drained
                .iter()
                .any(|envelope| matches!(envelope.event, Event::HydrationAborted { attempt: 1, .. }))
        );
    }

    #[test]
    fn error_status_aborts() {
        let flags = PendingFlags {
            lyrics: true,
            ..PendingFlags::default()
        };
        let mut session = HydrationSession::new(
            "3",
            flags,
            &TrackContent::default(),
            settings(30),
            EventBus::new(),
        );
        let outcome = session.apply_status(Ok(TrackStatusResponse {
            status: TrackStatusKind::Error,
            data: None,
            message: Some("Track not found in cache.".to_string()),
        }));
        assert_eq!(outcome, TickOutcome::Aborted);
    }

    #[test]
    fn cancel_blocks_later_reads() {
        let flags = PendingFlags {
            lyrics: true,
            ..PendingFlags::default()
        };
        let mut session = HydrationSession::new(
            "3",
            flags,
            &TrackContent::default(),
            settings(30),
            EventBus::new(),
        );
        session.cancel();
        assert_eq!(
            session.apply_status(pending(content("lyrics", "", None))),
            TickOutcome::Discarded
        );
        assert_eq!(session.attempt(), 0);
        assert_eq!(session.phase(), SessionPhase::Cancelled);
    }

    #[test]
    fn pending_flags_follow_content_markers() {
        let flags = PendingFlags::from_content(&content(
            "Loading lyrics...",
            "Translation not available.",
            None,
        ));
        assert_eq!(
            flags,
            PendingFlags {
                lyrics: true,
                translation: false,
                video: true,
            }
        );
        assert!(flags.any());
        assert!(!PendingFlags::default().any());
    }
}
