//! Sentinel-substring readiness mapping.
//!
//! The backend reports per-field progress only through placeholder text
//! embedded in the content itself. This module is the single place that
//! interprets those markers; everything else works with [`Readiness`].

use romanizer_api_models::TrackContent;
use romanizer_events::ContentKind;

/// Marker present while lyrics or a translation are still being generated.
pub const LOADING_MARKER: &str = "loading";
/// Marker present while a translation job is running.
pub const IN_PROGRESS_MARKER: &str = "in progress";
/// Markers identifying a translation that settled without usable content.
pub const FAILURE_MARKERS: [&str; 2] = ["not available", "failed"];

/// Readiness of one content field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Still being generated.
    Pending,
    /// Usable content present.
    Ready,
    /// Settled without usable content.
    Failed,
}

/// Classify the field backing `kind` in `content`.
#[must_use]
pub fn assess(kind: ContentKind, content: &TrackContent) -> Readiness {
    match kind {
        // Romanized text is copied alongside the original, so both follow the
        // original lyrics marker.
        ContentKind::Lyrics | ContentKind::Romanization => {
            if contains_marker(&content.original_lyrics, LOADING_MARKER) {
                Readiness::Pending
            } else {
                Readiness::Ready
            }
        }
        ContentKind::Translation => {
            let text = &content.translated_lyrics;
            if contains_marker(text, LOADING_MARKER) || contains_marker(text, IN_PROGRESS_MARKER) {
                Readiness::Pending
            } else if FAILURE_MARKERS
                .iter()
                .any(|marker| contains_marker(text, marker))
            {
                Readiness::Failed
            } else {
                Readiness::Ready
            }
        }
        ContentKind::Video => {
            if content
                .youtube_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
            {
                Readiness::Ready
            } else {
                Readiness::Pending
            }
        }
    }
}

fn contains_marker(text: &str, marker: &str) -> bool {
    text.to_lowercase().contains(marker)
}
