//! Single-shot mutations: one request, one notification, no state machine.

use romanizer_api_models::{
    CacheDeleteRequest, FavoriteRequest, MutationResponse, PlaylistDeleteRequest,
    PlaylistOrderRequest, PlaylistRenameRequest, PlaylistReorderRequest,
    PlaylistTrackDeleteRequest,
};
use romanizer_events::{EventBus, NotificationLevel};
use tracing::{info, warn};

use crate::api::{MutationRequest, RomanizerApi, ensure_accepted};
use crate::error::{ClientError, ClientResult};
use crate::library::{LibraryRow, LibraryView, ListKind};
use crate::selection::SelectionCoordinator;

/// Shown when the server refuses a cache deletion.
pub const CACHE_DELETE_REJECTED_MESSAGE: &str = "Could not remove item. Please try again.";
/// Shown when a cache deletion could not reach the server.
pub const CACHE_DELETE_FAILED_MESSAGE: &str = "An error occurred. Please try again.";
/// Shown when the server refuses a single favorite change.
pub const FAVORITE_REJECTED_MESSAGE: &str = "Action failed. Please try again.";
/// Shown when a single favorite change could not reach the server.
pub const FAVORITE_FAILED_MESSAGE: &str = "An error occurred.";
/// Asked before a track is removed from a playlist.
pub const REMOVE_TRACK_PROMPT: &str = "Are you sure you want to remove this song from the playlist?";
/// Asked before a playlist is deleted.
pub const DELETE_PLAYLIST_PROMPT: &str = "Are you sure you want to delete this playlist from your Spotify account? This action cannot be undone.";
/// Asked after the last track of a playlist was removed.
pub const EMPTY_PLAYLIST_PROMPT: &str = "This playlist is now empty. Would you like to delete it?";

const REORDER_FAILED_MESSAGE: &str = "Failed to save new order.";

/// Result of removing one track from a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRemoval {
    /// Replacement cover image, when the server regenerated it.
    pub new_image_url: Option<String>,
    /// Tracks left in the playlist, when reported.
    pub remaining_tracks: Option<u32>,
}

impl TrackRemoval {
    /// The playlist has no tracks left and may be offered for deletion.
    #[must_use]
    pub const fn playlist_is_empty(&self) -> bool {
        matches!(self.remaining_tracks, Some(0))
    }
}

/// Single-shot operations publishing to a shared event bus.
#[derive(Debug, Clone)]
pub struct LibraryActions {
    events: EventBus,
}

impl LibraryActions {
    /// Build the action set.
    #[must_use]
    pub const fn new(events: EventBus) -> Self {
        Self { events }
    }

    /// Flip the favorite marker of one row and move it to the front of the
    /// matching list. Returns the new marker value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the row is not rendered,
    /// otherwise the transport or server error after an error notification.
    pub async fn toggle_favorite<A>(
        &self,
        api: &A,
        view: &mut LibraryView,
        track_id: &str,
    ) -> ClientResult<bool>
    where
        A: RomanizerApi + ?Sized,
    {
        let Some(row) = view.row(track_id) else {
            return Err(ClientError::InvalidRequest {
                operation: "favorites.toggle",
                reason: "track is not rendered",
            });
        };
        let favorite = !row.is_favorite;
        let body = FavoriteRequest {
            cache_key: row.cache_key.clone(),
        };
        let request = if favorite {
            MutationRequest::AddFavorite(body)
        } else {
            MutationRequest::RemoveFavorite(body)
        };

        if let Err(err) = self.submit(api, &request).await {
            let message = if err.is_transport() {
                FAVORITE_FAILED_MESSAGE
            } else {
                FAVORITE_REJECTED_MESSAGE
            };
            self.events.notify(NotificationLevel::Error, message);
            return Err(err);
        }

        let (target, message) = if favorite {
            (ListKind::Favorites, "Added to favorites")
        } else {
            (ListKind::History, "Removed from favorites")
        };
        view.move_to_front(track_id, target, favorite);
        view.refresh_placeholders();
        self.events.notify(NotificationLevel::Success, message);
        Ok(favorite)
    }

    /// Drop one track's cached content and remove its row locally. The
    /// selection is pruned to the rows that remain.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error after an error notification;
    /// the view is left untouched.
    pub async fn delete_cache_item<A>(
        &self,
        api: &A,
        view: &mut LibraryView,
        selection: &mut SelectionCoordinator,
        track_id: &str,
    ) -> ClientResult<Option<LibraryRow>>
    where
        A: RomanizerApi + ?Sized,
    {
        let request = MutationRequest::DeleteCacheItem(CacheDeleteRequest {
            cache_key: view.cache_key_for(track_id),
        });
        if let Err(err) = self.submit(api, &request).await {
            let message = if err.is_transport() {
                CACHE_DELETE_FAILED_MESSAGE
            } else {
                CACHE_DELETE_REJECTED_MESSAGE
            };
            self.events.notify(NotificationLevel::Error, message);
            return Err(err);
        }
        let removed = view.remove(track_id);
        selection.replace_universe(view.track_ids());
        Ok(removed)
    }

    /// Remove one track from a playlist.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error after an error notification.
    pub async fn remove_playlist_track<A>(
        &self,
        api: &A,
        playlist_id: &str,
        track_id: &str,
    ) -> ClientResult<TrackRemoval>
    where
        A: RomanizerApi + ?Sized,
    {
        let request = MutationRequest::RemovePlaylistTrack(PlaylistTrackDeleteRequest {
            playlist_id: playlist_id.to_string(),
            track_id: track_id.to_string(),
        });
        let response = self
            .run(api, &request, "Failed to remove track.", "Track removed from playlist.", NotificationLevel::Success)
            .await?;
        Ok(TrackRemoval {
            new_image_url: response.new_image_url.filter(|url| !url.trim().is_empty()),
            remaining_tracks: response.remaining_tracks,
        })
    }

    /// Rename a playlist. Returns `false` without sending anything when the
    /// trimmed name is empty or unchanged.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error after an error notification.
    pub async fn rename_playlist<A>(
        &self,
        api: &A,
        playlist_id: &str,
        current_name: &str,
        new_name: &str,
    ) -> ClientResult<bool>
    where
        A: RomanizerApi + ?Sized,
    {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == current_name {
            return Ok(false);
        }
        let request = MutationRequest::RenamePlaylist(PlaylistRenameRequest {
            playlist_id: playlist_id.to_string(),
            new_name: new_name.to_string(),
        });
        self.run(api, &request, "Failed to rename.", "Playlist renamed!", NotificationLevel::Success)
            .await?;
        Ok(true)
    }

    /// Delete a playlist.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error after an error notification.
    pub async fn delete_playlist<A>(&self, api: &A, playlist_id: &str) -> ClientResult<()>
    where
        A: RomanizerApi + ?Sized,
    {
        let request = MutationRequest::DeletePlaylist(PlaylistDeleteRequest {
            playlist_id: playlist_id.to_string(),
        });
        self.run(
            api,
            &request,
            "Failed to delete playlist.",
            "Playlist deleted successfully.",
            NotificationLevel::Success,
        )
        .await?;
        Ok(())
    }

    /// Move one playlist item from `old_index` to `new_index`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the indices are equal,
    /// otherwise the transport or server error after an error notification.
    pub async fn reorder_playlist_item<A>(
        &self,
        api: &A,
        playlist_id: &str,
        old_index: u32,
        new_index: u32,
    ) -> ClientResult<()>
    where
        A: RomanizerApi + ?Sized,
    {
        if old_index == new_index {
            return Err(ClientError::InvalidRequest {
                operation: "playlist.reorder_items",
                reason: "item did not move",
            });
        }
        let request = MutationRequest::ReorderPlaylistItem(PlaylistReorderRequest {
            playlist_id: playlist_id.to_string(),
            old_index,
            new_index,
        });
        self.run(
            api,
            &request,
            REORDER_FAILED_MESSAGE,
            "Playlist order saved to Spotify.",
            NotificationLevel::Success,
        )
        .await?;
        Ok(())
    }

    /// Persist the display order of the playlist grid.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for an empty order, otherwise
    /// the transport or server error after an error notification.
    pub async fn save_playlist_order<A>(&self, api: &A, playlist_ids: Vec<String>) -> ClientResult<()>
    where
        A: RomanizerApi + ?Sized,
    {
        if playlist_ids.is_empty() {
            return Err(ClientError::InvalidRequest {
                operation: "playlists.save_order",
                reason: "order is empty",
            });
        }
        let request = MutationRequest::SavePlaylistOrder(PlaylistOrderRequest { playlist_ids });
        self.run(
            api,
            &request,
            REORDER_FAILED_MESSAGE,
            "Custom playlist order saved!",
            NotificationLevel::Info,
        )
        .await?;
        Ok(())
    }

    async fn run<A>(
        &self,
        api: &A,
        request: &MutationRequest,
        fallback: &str,
        success: &str,
        level: NotificationLevel,
    ) -> ClientResult<MutationResponse>
    where
        A: RomanizerApi + ?Sized,
    {
        match self.submit(api, request).await {
            Ok(response) => {
                self.events.notify(level, success);
                Ok(response)
            }
            Err(err) => {
                self.events.notify(
                    NotificationLevel::Error,
                    format!("Error: {}", err.user_message(fallback)),
                );
                Err(err)
            }
        }
    }

    async fn submit<A>(&self, api: &A, request: &MutationRequest) -> ClientResult<MutationResponse>
    where
        A: RomanizerApi + ?Sized,
    {
        let operation = request.operation();
        let outcome = api
            .submit_mutation(request)
            .await
            .and_then(|response| ensure_accepted(operation, response));
        match &outcome {
            Ok(_) => info!(operation, "mutation accepted"),
            Err(err) => warn!(operation, error = %err, "mutation failed"),
        }
        outcome
    }
}
