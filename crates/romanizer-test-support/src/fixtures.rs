//! Payload builders for track, job and mutation responses.

use romanizer_api_models::{
    MutationResponse, PrimeDispatchResponse, TrackContent, TrackStatusKind, TrackStatusResponse,
};
use romanizer_client::ClientError;

/// Placeholder text the backend serves while lyrics are generated.
pub const LOADING_LYRICS: &str = "Loading lyrics...";
/// Placeholder text the backend serves while a translation is generated.
pub const TRANSLATION_IN_PROGRESS: &str = "Translation in progress...";
/// Sample lyrics in the original script.
pub const ORIGINAL_LYRICS: &str = "夜に駆ける";
/// Sample romanized lyrics.
pub const ROMANIZED_LYRICS: &str = "yoru ni kakeru";
/// Sample translation.
pub const TRANSLATED_LYRICS: &str = "Racing into the night";
/// Sample embeddable video URL.
pub const VIDEO_URL: &str = "https://www.youtube.com/embed/x8VYWazR5mE";

/// Content with every field still generating.
#[must_use]
pub fn loading_content() -> TrackContent {
    TrackContent {
        original_lyrics: LOADING_LYRICS.to_string(),
        romanized_lyrics: LOADING_LYRICS.to_string(),
        translated_lyrics: TRANSLATION_IN_PROGRESS.to_string(),
        youtube_url: None,
        song_title: Some("Yoru ni Kakeru".to_string()),
    }
}

/// Content with every field ready.
#[must_use]
pub fn ready_content() -> TrackContent {
    TrackContent {
        original_lyrics: ORIGINAL_LYRICS.to_string(),
        romanized_lyrics: ROMANIZED_LYRICS.to_string(),
        translated_lyrics: TRANSLATED_LYRICS.to_string(),
        youtube_url: Some(VIDEO_URL.to_string()),
        song_title: Some("Yoru ni Kakeru".to_string()),
    }
}

/// Content whose lyrics are ready while translation and video still generate.
#[must_use]
pub fn lyrics_only_content() -> TrackContent {
    TrackContent {
        original_lyrics: ORIGINAL_LYRICS.to_string(),
        romanized_lyrics: ROMANIZED_LYRICS.to_string(),
        ..loading_content()
    }
}

/// `status: ok` envelope around `content`.
#[must_use]
pub fn status_ok(content: TrackContent) -> TrackStatusResponse {
    TrackStatusResponse {
        status: TrackStatusKind::Ok,
        data: Some(content),
        message: None,
    }
}

/// `status: error` envelope without data.
#[must_use]
pub fn status_error(message: &str) -> TrackStatusResponse {
    TrackStatusResponse {
        status: TrackStatusKind::Error,
        data: None,
        message: Some(message.to_string()),
    }
}

/// Accepted priming dispatch.
#[must_use]
pub fn dispatched(job_id: &str, tasks: u32) -> PrimeDispatchResponse {
    PrimeDispatchResponse {
        success: true,
        job_id: (tasks > 0).then(|| job_id.to_string()),
        tasks_dispatched: tasks,
        message: None,
        error: None,
    }
}

/// Mutation response with `success: true`.
#[must_use]
pub fn accepted() -> MutationResponse {
    MutationResponse {
        success: true,
        ..MutationResponse::default()
    }
}

/// Mutation response with `success: false` and an optional error message.
#[must_use]
pub fn rejected(error: Option<&str>) -> MutationResponse {
    MutationResponse {
        success: false,
        error: error.map(ToString::to_string),
        ..MutationResponse::default()
    }
}

/// Transport failure as produced by the HTTP layer.
#[must_use]
pub fn transport_error(operation: &'static str) -> ClientError {
    ClientError::transport(
        operation,
        std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
    )
}
