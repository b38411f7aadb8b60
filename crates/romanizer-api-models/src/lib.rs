#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Shared HTTP DTOs for the Romanizer web API.
//!
//! These types are consumed by the coordination core and by the CLI so the
//! request/response contract lives in one place. Field names follow the wire
//! format exactly; readiness of track content is carried inside free text and
//! is interpreted by the client, never here.
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level status reported by `GET /api/track/status/{track_id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatusKind {
    /// Generic success marker.
    Ok,
    /// Content is still being generated for at least one field.
    Pending,
    /// Every content field has been produced.
    Complete,
    /// The backend could not serve the track (e.g. missing from cache).
    Error,
    /// Any status string this client does not recognise.
    #[serde(other)]
    Unknown,
}

/// Envelope returned by the track status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackStatusResponse {
    /// Overall status marker.
    pub status: TrackStatusKind,
    /// Current content snapshot; absent on error responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TrackContent>,
    /// Optional diagnostic message supplied alongside errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Content fields for a single track as cached by the backend.
///
/// Text fields may still hold placeholder sentences such as
/// `"Loading lyrics..."` while background work is running.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackContent {
    /// Lyrics in the original script.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_lyrics: String,
    /// Romanized rendition of the original lyrics.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub romanized_lyrics: String,
    /// Machine translation of the lyrics.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub translated_lyrics: String,
    /// Embeddable video URL once a match has been found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    /// Display title of the song.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_title: Option<String>,
}

/// Response from `POST /api/playlist/prime_cache/{playlist_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrimeDispatchResponse {
    /// Whether the dispatch was accepted.
    #[serde(default)]
    pub success: bool,
    /// Identifier of the dispatched job; absent when nothing was dispatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Number of background tasks queued. Zero means nothing to do.
    #[serde(default)]
    pub tasks_dispatched: u32,
    /// Informational message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure description when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status marker the backend returns once a job counter no longer exists.
pub const JOB_STATUS_UNKNOWN: &str = "UNKNOWN";

/// Response from `GET /api/priming/status/{job_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrimingStatusResponse {
    /// Backend job marker (`PENDING`, `UNKNOWN`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Authoritative count of completed tasks.
    #[serde(default)]
    pub completed: u32,
}

impl PrimingStatusResponse {
    /// Whether the backend reported that it no longer tracks the job.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case(JOB_STATUS_UNKNOWN))
    }
}

/// Generic response shape shared by every mutation endpoint.
///
/// Action-specific fields are optional; callers read the ones that apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationResponse {
    /// All-or-nothing outcome of the call.
    #[serde(default)]
    pub success: bool,
    /// Failure description supplied by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Informational message supplied by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Tracks newly added to a playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<u32>,
    /// Tracks skipped because they were already present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<u32>,
    /// Replacement cover image after a playlist changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image_url: Option<String>,
    /// Tracks left in a playlist after a removal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_tracks: Option<u32>,
}

/// Body for `POST /api/favorites/add_bulk` and `/api/favorites/remove_bulk`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavoritesBulkRequest {
    /// Cache keys of the affected tracks.
    pub cache_keys: Vec<String>,
}

/// Body for `POST /api/playlist/add_tracks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddTracksRequest {
    /// Tracks to append.
    pub track_ids: Vec<String>,
    /// Destination playlist.
    pub playlist_id: String,
}

/// Body for `POST /api/create_playlist`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePlaylistRequest {
    /// Tracks placed in the new playlist.
    pub track_ids: Vec<String>,
    /// Name of the new playlist.
    pub playlist_name: String,
}

/// Body for `POST /api/favorites/add` and `/api/favorites/remove`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavoriteRequest {
    /// Cache key of the track whose marker changes.
    pub cache_key: String,
}

/// Body for `POST /api/cache/delete`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheDeleteRequest {
    /// Cache key of the entry to drop.
    pub cache_key: String,
}

/// Body for `POST /api/playlist/delete`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistDeleteRequest {
    /// Playlist to delete.
    pub playlist_id: String,
}

/// Body for `POST /api/playlist/track/delete`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistTrackDeleteRequest {
    /// Playlist holding the track.
    pub playlist_id: String,
    /// Track to remove.
    pub track_id: String,
}

/// Body for `POST /api/playlist/rename`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistRenameRequest {
    /// Playlist to rename.
    pub playlist_id: String,
    /// Replacement name.
    pub new_name: String,
}

/// Body for `POST /api/playlist/reorder_items`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistReorderRequest {
    /// Playlist whose items move.
    pub playlist_id: String,
    /// Current index of the moved item.
    pub old_index: u32,
    /// Target index of the moved item.
    pub new_index: u32,
}

/// Body for `POST /api/playlists/save_order`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistOrderRequest {
    /// Playlist identifiers in display order.
    pub playlist_ids: Vec<String>,
}

/// Entry returned by `GET /api/playlists`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistSummary {
    /// Playlist identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Cover image; empty when the playlist has none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    /// Owner display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Number of tracks in the playlist.
    #[serde(default)]
    pub total_tracks: u32,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn track_status_tolerates_null_and_missing_fields() {
        let payload = json!({
            "status": "pending",
            "data": {
                "original_lyrics": "Loading lyrics...",
                "romanized_lyrics": null,
                "youtube_url": null,
                "artist_name": "ignored"
            }
        });
        let parsed: TrackStatusResponse =
            serde_json::from_value(payload).expect("status payload should decode");
        assert_eq!(parsed.status, TrackStatusKind::Pending);
        let data = parsed.data.expect("data present");
        assert_eq!(data.original_lyrics, "Loading lyrics...");
        assert!(data.romanized_lyrics.is_empty());
        assert!(data.translated_lyrics.is_empty());
        assert!(data.youtube_url.is_none());
    }

    #[test]
    fn unrecognised_track_status_maps_to_unknown() {
        let parsed: TrackStatusResponse =
            serde_json::from_value(json!({"status": "warming"})).expect("decode");
        assert_eq!(parsed.status, TrackStatusKind::Unknown);
        assert!(parsed.data.is_none());
    }

    #[test]
    fn error_envelope_keeps_message() {
        let parsed: TrackStatusResponse = serde_json::from_value(json!({
            "status": "error",
            "message": "Track not found in cache."
        }))
        .expect("decode");
        assert_eq!(parsed.status, TrackStatusKind::Error);
        assert_eq!(parsed.message.as_deref(), Some("Track not found in cache."));
    }

    #[test]
    fn dispatch_without_job_defaults_to_zero_tasks() {
        let parsed: PrimeDispatchResponse = serde_json::from_value(json!({
            "success": true,
            "message": "All tracks are already cached.",
            "tasks_dispatched": 0
        }))
        .expect("decode");
        assert!(parsed.success);
        assert_eq!(parsed.tasks_dispatched, 0);
        assert!(parsed.job_id.is_none());
    }

    #[test]
    fn priming_status_detects_expired_job_marker() {
        let expired: PrimingStatusResponse =
            serde_json::from_value(json!({"status": "UNKNOWN", "completed": 0})).expect("decode");
        assert!(expired.is_unknown());

        let running: PrimingStatusResponse =
            serde_json::from_value(json!({"status": "PENDING", "completed": 3})).expect("decode");
        assert!(!running.is_unknown());
        assert_eq!(running.completed, 3);

        let bare: PrimingStatusResponse =
            serde_json::from_value(json!({"completed": 1})).expect("decode");
        assert!(!bare.is_unknown());
    }

    #[test]
    fn mutation_response_defaults_to_failure_without_success_flag() {
        let parsed: MutationResponse =
            serde_json::from_value(json!({"error": "Missing cache_keys"})).expect("decode");
        assert!(!parsed.success);
        assert_eq!(parsed.error.as_deref(), Some("Missing cache_keys"));

        let added: MutationResponse =
            serde_json::from_value(json!({"success": true, "added": 2, "skipped": 1}))
                .expect("decode");
        assert_eq!(added.added, Some(2));
        assert_eq!(added.skipped, Some(1));
    }

    #[test]
    fn playlist_summary_accepts_missing_image() {
        let parsed: PlaylistSummary = serde_json::from_value(json!({
            "id": "pl1",
            "name": "Road trip",
            "image_url": null,
            "total_tracks": 12
        }))
        .expect("decode");
        assert!(parsed.image_url.is_empty());
        assert_eq!(parsed.total_tracks, 12);
    }
}
