//! Batched mutations over a selection snapshot.
//!
//! [`BulkMutationReconciler::apply`] sends exactly one request for the whole
//! snapshot and touches local state only after the server accepted the batch.
//! A rejected or failed batch leaves the [`LibraryView`] exactly as it was.

use romanizer_api_models::{AddTracksRequest, CreatePlaylistRequest, FavoritesBulkRequest};
use romanizer_events::{Event, EventBus, NotificationLevel};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{MutationRequest, RomanizerApi, ensure_accepted};
use crate::error::ClientError;
use crate::library::{ListKind, LibraryView};

/// Fallback shown when a bulk favorite change fails without a server message.
pub const BULK_FAVORITE_FAILED_MESSAGE: &str = "Bulk action failed on the server.";
/// Fallback shown when adding tracks fails without a server message.
pub const ADD_TRACKS_FAILED_MESSAGE: &str = "Failed to add songs.";
/// Shown once a playlist creation has been accepted.
pub const PLAYLIST_CREATION_STARTED_MESSAGE: &str =
    "Playlist creation started! It will appear in 'My Playlists' soon.";

/// Action applied to every id in a selection snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAction {
    /// Move rows into favorites.
    Favorite,
    /// Move rows back into history.
    Unfavorite,
    /// Append the tracks to an existing playlist.
    AddToPlaylist {
        /// Target playlist.
        playlist_id: String,
    },
    /// Create a new playlist holding the tracks.
    CreatePlaylistAndAdd {
        /// Name of the playlist to create.
        name: String,
    },
}

impl BulkAction {
    /// Label used in logs and [`Event::BulkApplied`].
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::Unfavorite => "unfavorite",
            Self::AddToPlaylist { .. } => "add_to_playlist",
            Self::CreatePlaylistAndAdd { .. } => "create_playlist",
        }
    }

    /// Whether the user must confirm before the request goes out.
    #[must_use]
    pub const fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Favorite | Self::Unfavorite)
    }

    /// Confirmation prompt for a batch of `count` items.
    #[must_use]
    pub fn confirmation_prompt(&self, count: usize) -> String {
        format!(
            "Are you sure you want to {} {count} selected song(s)?",
            self.label()
        )
    }

    const fn failure_fallback(&self) -> &'static str {
        match self {
            Self::Favorite | Self::Unfavorite => BULK_FAVORITE_FAILED_MESSAGE,
            Self::AddToPlaylist { .. } | Self::CreatePlaylistAndAdd { .. } => {
                ADD_TRACKS_FAILED_MESSAGE
            }
        }
    }
}

/// User confirmation collaborator.
pub trait Confirm {
    /// Ask the user; `true` means go ahead.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms every prompt. Used when the caller already asked, e.g. `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Errors raised by [`BulkMutationReconciler::apply`].
#[derive(Debug, Error)]
pub enum BulkError {
    /// The snapshot held no ids.
    #[error("no items selected")]
    EmptySelection,
    /// The user declined the confirmation prompt.
    #[error("bulk action cancelled")]
    Cancelled,
    /// The action parameters were rejected before sending.
    #[error("invalid bulk action")]
    Invalid {
        /// Why the action was rejected.
        reason: &'static str,
    },
    /// The request failed or the server rejected the batch.
    #[error("bulk action failed")]
    Failed {
        /// Action label.
        action: &'static str,
        /// Underlying client error.
        #[source]
        source: ClientError,
    },
}

/// Summary of an accepted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    /// Action label.
    pub action: &'static str,
    /// Ids sent in the batch.
    pub count: usize,
    /// Rows moved between lists locally.
    pub moved: usize,
    /// Tracks newly added to a playlist, when reported.
    pub added: Option<u32>,
    /// Duplicates skipped by the server, when reported.
    pub skipped: Option<u32>,
    /// Notification text published for the batch.
    pub message: String,
}

/// Applies confirmed bulk actions. Holds no state beyond its event sink.
#[derive(Debug, Clone)]
pub struct BulkMutationReconciler {
    events: EventBus,
}

impl BulkMutationReconciler {
    /// Build a reconciler publishing to `events`.
    #[must_use]
    pub const fn new(events: EventBus) -> Self {
        Self { events }
    }

    /// Apply `action` to `snapshot`, the selection captured when the user
    /// confirmed. One request carries the whole batch; `view` changes only
    /// after the server accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::EmptySelection`], [`BulkError::Invalid`] or
    /// [`BulkError::Cancelled`] without sending anything, and
    /// [`BulkError::Failed`] after an error notification when the request
    /// fails.
    pub async fn apply<A, C>(
        &self,
        api: &A,
        confirm: &mut C,
        view: &mut LibraryView,
        action: &BulkAction,
        snapshot: &[String],
    ) -> Result<BulkReport, BulkError>
    where
        A: RomanizerApi + ?Sized,
        C: Confirm + ?Sized,
    {
        if snapshot.is_empty() {
            return Err(BulkError::EmptySelection);
        }
        let request = build_request(action, view, snapshot)?;
        if action.requires_confirmation()
            && !confirm.confirm(&action.confirmation_prompt(snapshot.len()))
        {
            info!(action = action.label(), count = snapshot.len(), "bulk action declined");
            return Err(BulkError::Cancelled);
        }

        let operation = request.operation();
        let response = match api
            .submit_mutation(&request)
            .await
            .and_then(|response| ensure_accepted(operation, response))
        {
            Ok(response) => response,
            Err(source) => {
                warn!(action = action.label(), count = snapshot.len(), error = %source, "bulk action failed");
                self.events.notify(
                    NotificationLevel::Error,
                    format!("Error: {}", source.user_message(action.failure_fallback())),
                );
                return Err(BulkError::Failed {
                    action: action.label(),
                    source,
                });
            }
        };

        let (level, message, moved) = match action {
            BulkAction::Favorite => (
                NotificationLevel::Success,
                format!("Successfully favorited {} song(s).", snapshot.len()),
                move_rows(view, snapshot, ListKind::Favorites, true),
            ),
            BulkAction::Unfavorite => (
                NotificationLevel::Success,
                format!("Successfully unfavorited {} song(s).", snapshot.len()),
                move_rows(view, snapshot, ListKind::History, false),
            ),
            BulkAction::AddToPlaylist { .. } => (
                NotificationLevel::Success,
                added_message(response.added.unwrap_or_default(), response.skipped),
                0,
            ),
            BulkAction::CreatePlaylistAndAdd { .. } => (
                NotificationLevel::Info,
                PLAYLIST_CREATION_STARTED_MESSAGE.to_string(),
                0,
            ),
        };

        info!(action = action.label(), count = snapshot.len(), moved, "bulk action applied");
        self.events.notify(level, message.clone());
        self.events.publish(Event::BulkApplied {
            action: action.label().to_string(),
            count: snapshot.len(),
        });
        Ok(BulkReport {
            action: action.label(),
            count: snapshot.len(),
            moved,
            added: response.added,
            skipped: response.skipped,
            message,
        })
    }
}

fn build_request(
    action: &BulkAction,
    view: &LibraryView,
    snapshot: &[String],
) -> Result<MutationRequest, BulkError> {
    let cache_keys = || FavoritesBulkRequest {
        cache_keys: snapshot.iter().map(|id| view.cache_key_for(id)).collect(),
    };
    let request = match action {
        BulkAction::Favorite => MutationRequest::AddFavorites(cache_keys()),
        BulkAction::Unfavorite => MutationRequest::RemoveFavorites(cache_keys()),
        BulkAction::AddToPlaylist { playlist_id } => {
            if playlist_id.trim().is_empty() {
                return Err(BulkError::Invalid {
                    reason: "playlist id is required",
                });
            }
            MutationRequest::AddTracks(AddTracksRequest {
                track_ids: snapshot.to_vec(),
                playlist_id: playlist_id.clone(),
            })
        }
        BulkAction::CreatePlaylistAndAdd { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(BulkError::Invalid {
                    reason: "playlist name is required",
                });
            }
            MutationRequest::CreatePlaylist(CreatePlaylistRequest {
                track_ids: snapshot.to_vec(),
                playlist_name: name.to_string(),
            })
        }
    };
    Ok(request)
}

/// Prepend each row to `target` in snapshot order, so the last id ends up on
/// top, then refresh both placeholders.
fn move_rows(view: &mut LibraryView, snapshot: &[String], target: ListKind, favorite: bool) -> usize {
    let moved = snapshot
        .iter()
        .filter(|id| view.move_to_front(id, target, favorite))
        .count();
    view.refresh_placeholders();
    moved
}

fn added_message(added: u32, skipped: Option<u32>) -> String {
    match skipped {
        Some(skipped) if skipped > 0 => {
            format!("Added {added} new song(s). Skipped {skipped} duplicate(s).")
        }
        _ => format!("Added {added} new song(s)."),
    }
}
