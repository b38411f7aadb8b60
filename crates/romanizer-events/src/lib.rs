#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Event bus for the Romanizer client.
//!
//! Coordinators never talk to a renderer directly. They publish typed events
//! (notifications, slot transitions, job progress) on this bus and whatever
//! front end is attached (CLI printer, test harness) subscribes. Subscribers
//! that attach late can replay recent events by id. Internally it uses
//! `tokio::broadcast` with a bounded buffer; when the channel overflows the
//! oldest events are dropped.

mod payloads;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::{Receiver, Sender};

pub use payloads::{ContentKind, EventId, JobOutcome, NotificationLevel, SlotStatus};

/// Default buffer size for the in-memory replay ring.
const DEFAULT_REPLAY_CAPACITY: usize = 256;

/// Typed events surfaced by the coordination core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Transient user-facing message (toast).
    Notification {
        /// Severity.
        level: NotificationLevel,
        /// Message text.
        message: String,
    },
    /// A content slot left the pending state.
    SlotSettled {
        /// Track owning the slot.
        track_id: String,
        /// Slot that settled.
        kind: ContentKind,
        /// Terminal slot state.
        status: SlotStatus,
    },
    /// Hydration session reached its single terminal state.
    HydrationFinalized {
        /// Track whose page finished hydrating.
        track_id: String,
        /// Number of status polls performed.
        attempts: u32,
        /// Whether the attempt budget forced pending slots to fail.
        timed_out: bool,
    },
    /// Hydration polling stopped after a failed status read.
    HydrationAborted {
        /// Track whose session stopped.
        track_id: String,
        /// Attempt at which the failure occurred.
        attempt: u32,
    },
    /// Authoritative progress reported for a background job.
    JobProgress {
        /// Job identifier.
        job_id: String,
        /// Completed tasks as reported by the server.
        completed: u32,
        /// Tasks dispatched for the job.
        total: u32,
    },
    /// Background job poller reached a terminal state.
    JobFinished {
        /// Job identifier.
        job_id: String,
        /// How the poller terminated.
        outcome: JobOutcome,
    },
    /// Selection set changed on a list page.
    SelectionChanged {
        /// Number of selected items.
        selected: usize,
        /// Size of the selectable universe.
        total: usize,
    },
    /// A bulk mutation succeeded and was applied locally.
    BulkApplied {
        /// Action label (`favorite`, `unfavorite`, ...).
        action: String,
        /// Number of items in the batch.
        count: usize,
    },
}

impl Event {
    /// Machine-friendly discriminator for renderers and log filters.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Notification { .. } => "notification",
            Self::SlotSettled { .. } => "slot_settled",
            Self::HydrationFinalized { .. } => "hydration_finalized",
            Self::HydrationAborted { .. } => "hydration_aborted",
            Self::JobProgress { .. } => "job_progress",
            Self::JobFinished { .. } => "job_finished",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::BulkApplied { .. } => "bulk_applied",
        }
    }

    /// Build a notification event.
    #[must_use]
    pub fn notification(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self::Notification {
            level,
            message: message.into(),
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event.
    pub event: Event,
}

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    buffer: Arc<Mutex<VecDeque<EventEnvelope>>>,
    next_id: Arc<AtomicU64>,
    replay_capacity: usize,
}

impl EventBus {
    /// Construct a new bus with the provided broadcast capacity.
    ///
    /// A zero capacity is raised to one so the broadcast channel can be built.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            next_id: Arc::new(AtomicU64::new(1)),
            replay_capacity: capacity,
        }
    }

    /// Construct a bus with the default in-memory buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish a new event to the bus, assigning it a sequential identifier.
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        {
            let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            if buffer.len() == self.replay_capacity {
                buffer.pop_front();
            }
            buffer.push_back(envelope.clone());
        }

        // No live subscribers is fine; the replay ring still holds the event.
        let _ = self.sender.send(envelope);
        id
    }

    /// Publish a notification at the given level.
    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> EventId {
        self.publish(Event::notification(level, message))
    }

    /// Subscribe to the bus, replaying any buffered events newer than `since_id`.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let mut backlog = VecDeque::new();
        if let Some(since) = since_id {
            let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            backlog.extend(buffer.iter().filter(|item| item.id > since).cloned());
        }

        let receiver = self.sender.subscribe();
        EventStream { backlog, receiver }
    }

    /// Returns the last assigned identifier, if any events have been published.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.back().map(|event| event.id)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream wrapper that yields events either from the replay backlog or from the
/// live broadcast channel.
#[derive(Debug)]
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Receive the next event, respecting the replay backlog first.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next already-delivered event without waiting.
    pub fn try_next(&mut self) -> Option<EventEnvelope> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }

        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain every event currently available without waiting.
    pub fn drain(&mut self) -> Vec<EventEnvelope> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::task;
    use tokio::time::timeout;

    const PUBLISH_TIMEOUT: Duration = Duration::from_secs(1);

    fn sample_progress_event(id: u32) -> Event {
        Event::JobProgress {
            job_id: "job123".to_string(),
            completed: id,
            total: 500,
        }
    }

    #[tokio::test]
    async fn sequential_ids_and_replay() {
        let bus = EventBus::with_capacity(16);

        let mut last_id = 0;
        for i in 0..5 {
            last_id = bus.publish(sample_progress_event(i));
        }
        assert_eq!(last_id, 5);
        assert_eq!(bus.last_event_id(), Some(5));

        let mut stream = bus.subscribe(Some(2));
        let mut received = Vec::new();
        for _ in 0..3 {
            if let Some(event) = stream.next().await {
                received.push(event);
            }
        }

        assert_eq!(received.len(), 3);
        assert_eq!(received.first().map(|e| e.id), Some(3));
        assert_eq!(received.last().map(|e| e.id), Some(5));
    }

    #[test]
    fn replay_ring_drops_oldest_when_full() {
        let bus = EventBus::with_capacity(2);
        for i in 0..4 {
            let _ = bus.publish(sample_progress_event(i));
        }
        let mut stream = bus.subscribe(Some(0));
        let ids: Vec<_> = stream.drain().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn try_next_returns_none_when_idle() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe(None);
        assert!(stream.try_next().is_none());

        let _ = bus.notify(NotificationLevel::Success, "done");
        let envelope = stream.try_next().expect("notification delivered");
        assert_eq!(
            envelope.event,
            Event::notification(NotificationLevel::Success, "done")
        );
        assert!(stream.try_next().is_none());
    }

    #[test]
    fn events_serialise_with_type_tag() {
        let event = Event::SlotSettled {
            track_id: "42".to_string(),
            kind: ContentKind::Translation,
            status: SlotStatus::Failed,
        };
        let value = serde_json::to_value(&event).expect("serialise");
        assert_eq!(value["type"], "slot_settled");
        assert_eq!(value["kind"], "translation");
        assert_eq!(value["status"], "failed");
        assert_eq!(event.kind(), "slot_settled");
    }

    #[test]
    fn slot_status_settled_flags() {
        assert!(!SlotStatus::Pending.is_settled());
        assert!(SlotStatus::Ready.is_settled());
        assert!(SlotStatus::Failed.is_settled());
        assert_eq!(ContentKind::ALL.len(), 4);
        assert_eq!(NotificationLevel::Error.to_string(), "error");
    }

    #[tokio::test]
    async fn load_test_does_not_stall_publishers() {
        let bus = Arc::new(EventBus::with_capacity(512));
        let mut stream = bus.subscribe(None);

        let publisher = {
            let bus = bus.clone();
            task::spawn(async move {
                for i in 0..500 {
                    let publish_bus = bus.clone();
                    timeout(PUBLISH_TIMEOUT, async move {
                        let _ = publish_bus.publish(sample_progress_event(i));
                    })
                    .await
                    .expect("publish timed out");
                }
            })
        };

        let consumer = task::spawn(async move {
            let mut ids = HashSet::new();
            while ids.len() < 500 {
                if let Some(event) = stream.next().await {
                    ids.insert(event.id);
                }
            }
            ids
        });

        publisher.await.expect("publisher task panicked");
        let ids = consumer.await.expect("consumer task panicked");
        assert_eq!(ids.len(), 500);
    }
}
