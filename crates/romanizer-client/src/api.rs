//! Transport seam between the coordinators and the backend.
//!
//! Coordinators only ever see [`RomanizerApi`]; the reqwest implementation
//! lives in [`crate::http`] and tests substitute scripted fakes.

use async_trait::async_trait;
use romanizer_api_models::{
    AddTracksRequest, CacheDeleteRequest, CreatePlaylistRequest, FavoriteRequest, FavoritesBulkRequest,
    MutationResponse, PlaylistDeleteRequest, PlaylistOrderRequest, PlaylistRenameRequest,
    PlaylistReorderRequest, PlaylistSummary, PlaylistTrackDeleteRequest, PrimeDispatchResponse,
    TrackStatusResponse,
};

use crate::error::{ClientError, ClientResult};

/// Outcome of a job status read that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatusReply {
    /// Server reported its authoritative completed count.
    Progress {
        /// Tasks completed so far.
        completed: u32,
    },
    /// Server no longer tracks the job (404 or an `UNKNOWN` marker).
    Absent,
    /// Any other non-success answer; polling should simply continue.
    Unavailable {
        /// HTTP status returned.
        status: u16,
    },
}

/// One mutation call against the backend. Every variant is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    /// Mark one cached track as a favorite.
    AddFavorite(FavoriteRequest),
    /// Clear the favorite marker on one cached track.
    RemoveFavorite(FavoriteRequest),
    /// Mark a batch of cached tracks as favorites.
    AddFavorites(FavoritesBulkRequest),
    /// Clear the favorite marker on a batch of cached tracks.
    RemoveFavorites(FavoritesBulkRequest),
    /// Append tracks to an existing playlist.
    AddTracks(AddTracksRequest),
    /// Create a playlist holding the given tracks.
    CreatePlaylist(CreatePlaylistRequest),
    /// Drop one entry from the content cache.
    DeleteCacheItem(CacheDeleteRequest),
    /// Delete a playlist.
    DeletePlaylist(PlaylistDeleteRequest),
    /// Remove one track from a playlist.
    RemovePlaylistTrack(PlaylistTrackDeleteRequest),
    /// Rename a playlist.
    RenamePlaylist(PlaylistRenameRequest),
    /// Move one item inside a playlist.
    ReorderPlaylistItem(PlaylistReorderRequest),
    /// Persist the display order of the playlist grid.
    SavePlaylistOrder(PlaylistOrderRequest),
}

impl MutationRequest {
    /// Endpoint path relative to the backend origin.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::AddFavorite(_) => "/api/favorites/add",
            Self::RemoveFavorite(_) => "/api/favorites/remove",
            Self::AddFavorites(_) => "/api/favorites/add_bulk",
            Self::RemoveFavorites(_) => "/api/favorites/remove_bulk",
            Self::AddTracks(_) => "/api/playlist/add_tracks",
            Self::CreatePlaylist(_) => "/api/create_playlist",
            Self::DeleteCacheItem(_) => "/api/cache/delete",
            Self::DeletePlaylist(_) => "/api/playlist/delete",
            Self::RemovePlaylistTrack(_) => "/api/playlist/track/delete",
            Self::RenamePlaylist(_) => "/api/playlist/rename",
            Self::ReorderPlaylistItem(_) => "/api/playlist/reorder_items",
            Self::SavePlaylistOrder(_) => "/api/playlists/save_order",
        }
    }

    /// Operation identifier used in logs and errors.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::AddFavorite(_) => "favorites.add",
            Self::RemoveFavorite(_) => "favorites.remove",
            Self::AddFavorites(_) => "favorites.add_bulk",
            Self::RemoveFavorites(_) => "favorites.remove_bulk",
            Self::AddTracks(_) => "playlist.add_tracks",
            Self::CreatePlaylist(_) => "playlist.create",
            Self::DeleteCacheItem(_) => "cache.delete",
            Self::DeletePlaylist(_) => "playlist.delete",
            Self::RemovePlaylistTrack(_) => "playlist.track.delete",
            Self::RenamePlaylist(_) => "playlist.rename",
            Self::ReorderPlaylistItem(_) => "playlist.reorder_items",
            Self::SavePlaylistOrder(_) => "playlists.save_order",
        }
    }
}

/// Backend operations used by the coordination core.
#[async_trait]
pub trait RomanizerApi: Send + Sync {
    /// Read the cached content status of a track.
    async fn track_status(&self, track_id: &str) -> ClientResult<TrackStatusResponse>;

    /// Read progress of a dispatched background job.
    async fn priming_status(&self, job_id: &str) -> ClientResult<JobStatusReply>;

    /// Dispatch cache warm-up for every uncached track of a playlist.
    async fn dispatch_priming(&self, playlist_id: &str) -> ClientResult<PrimeDispatchResponse>;

    /// List the playlists the user can add tracks to.
    async fn list_playlists(&self) -> ClientResult<Vec<PlaylistSummary>>;

    /// Send one mutation and return the decoded response body, whatever its
    /// `success` flag says.
    async fn submit_mutation(&self, request: &MutationRequest) -> ClientResult<MutationResponse>;
}

/// Turn a decoded mutation response into a result, treating `success:false`
/// as a server rejection.
///
/// # Errors
///
/// Returns [`ClientError::Server`] carrying the server's message when the
/// response is not successful.
pub fn ensure_accepted(
    operation: &'static str,
    response: MutationResponse,
) -> ClientResult<MutationResponse> {
    if response.success {
        return Ok(response);
    }
    Err(ClientError::Server {
        operation,
        status: None,
        message: response.error.or(response.message),
    })
}
