//! Payload vocabulary shared by events emitted from the coordination core.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identifier assigned to each event published on the bus.
pub type EventId = u64;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Neutral progress information.
    Info,
    /// Positive completion.
    Success,
    /// Something the user should act on.
    Error,
}

impl NotificationLevel {
    /// Lower-case label used by renderers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl Display for NotificationLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Independently completing piece of track page content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Lyrics in the original script.
    Lyrics,
    /// Romanized lyrics; settles together with [`ContentKind::Lyrics`].
    Romanization,
    /// Machine translation.
    Translation,
    /// Embedded video player.
    Video,
}

impl ContentKind {
    /// Every slot kind in display order.
    pub const ALL: [Self; 4] = [
        Self::Lyrics,
        Self::Romanization,
        Self::Translation,
        Self::Video,
    ];

    /// Lower-case label used in logs and rendered output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lyrics => "lyrics",
            Self::Romanization => "romanization",
            Self::Translation => "translation",
            Self::Video => "video",
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Lifecycle state of a content slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Still waiting for the backend.
    Pending,
    /// Content available and rendered.
    Ready,
    /// Settled without usable content (hidden or timed out).
    Failed,
}

impl SlotStatus {
    /// Whether the slot has left the pending state.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Terminal state reached by a background job poller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    /// Server reported every task completed.
    Complete,
    /// Server no longer tracks the job; treated as complete.
    Expired,
    /// Polling stopped after a transport failure.
    Aborted,
}
