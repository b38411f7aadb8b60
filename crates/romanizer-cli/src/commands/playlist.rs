//! Playlist page actions.

use romanizer_client::mutations::{DELETE_PLAYLIST_PROMPT, EMPTY_PLAYLIST_PROMPT, REMOVE_TRACK_PROMPT};
use romanizer_client::{
    AlwaysConfirm, BulkAction, BulkMutationReconciler, LibraryActions, LibraryView,
    RomanizerApi, SelectionCoordinator,
};

use crate::cli::{
    OutputFormat, PlaylistAddArgs, PlaylistCreateArgs, PlaylistDeleteArgs,
    PlaylistRemoveTrackArgs, PlaylistRenameArgs, PlaylistReorderArgs, PlaylistSaveOrderArgs,
};
use crate::client::{AppContext, CliError, CliResult, client_failure, confirmer, normalize_ids};
use crate::commands::library::finish_bulk;
use crate::output::{render_pending_events, render_playlists};

pub(crate) async fn handle_playlist_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let playlists = ctx.api.list_playlists().await.map_err(client_failure)?;
    render_playlists(&playlists, format)
}

pub(crate) async fn handle_playlist_add(
    ctx: &AppContext,
    args: PlaylistAddArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let action = BulkAction::AddToPlaylist {
        playlist_id: args.playlist_id.trim().to_string(),
    };
    apply_to_tracks(ctx, &args.track_ids, &action, format).await
}

pub(crate) async fn handle_playlist_create(
    ctx: &AppContext,
    args: PlaylistCreateArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let action = BulkAction::CreatePlaylistAndAdd { name: args.name };
    apply_to_tracks(ctx, &args.track_ids, &action, format).await
}

/// Select every listed track on an otherwise empty search page and apply
/// `action` to the snapshot.
async fn apply_to_tracks(
    ctx: &AppContext,
    track_ids: &[String],
    action: &BulkAction,
    format: OutputFormat,
) -> CliResult<()> {
    let track_ids = normalize_ids(track_ids, "track id")?;
    let mut selection = SelectionCoordinator::new(track_ids, ctx.events.clone());
    selection.select_all_or_clear();
    let snapshot = selection.snapshot();

    let mut view = LibraryView::new(Vec::new(), Vec::new());
    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let result = BulkMutationReconciler::new(ctx.events.clone())
        .apply(ctx.api.as_ref(), &mut AlwaysConfirm, &mut view, action, &snapshot)
        .await;
    render_pending_events(&mut stream, format)?;
    finish_bulk(result, format)
}

pub(crate) async fn handle_playlist_rename(
    ctx: &AppContext,
    args: PlaylistRenameArgs,
    format: OutputFormat,
) -> CliResult<()> {
    if args.new_name.trim().is_empty() {
        return Err(CliError::validation("new playlist name must not be empty"));
    }
    let current = args.current_name.as_deref().map_or("", str::trim);

    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let result = LibraryActions::new(ctx.events.clone())
        .rename_playlist(ctx.api.as_ref(), args.playlist_id.trim(), current, &args.new_name)
        .await;
    render_pending_events(&mut stream, format)?;
    if !result.map_err(client_failure)? {
        eprintln!("name unchanged; nothing was sent");
    }
    Ok(())
}

pub(crate) async fn handle_playlist_delete(
    ctx: &AppContext,
    args: PlaylistDeleteArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let mut confirm = confirmer(args.yes)?;
    if !confirm.confirm(DELETE_PLAYLIST_PROMPT) {
        eprintln!("cancelled; nothing was sent");
        return Ok(());
    }

    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let result = LibraryActions::new(ctx.events.clone())
        .delete_playlist(ctx.api.as_ref(), args.playlist_id.trim())
        .await;
    render_pending_events(&mut stream, format)?;
    result.map_err(client_failure)
}

/// Remove one track. When that leaves the playlist empty, offer to delete it;
/// `--yes` alone never deletes, `--delete-if-empty` does so without asking.
pub(crate) async fn handle_playlist_remove_track(
    ctx: &AppContext,
    args: PlaylistRemoveTrackArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let playlist_id = args.playlist_id.trim();
    let mut confirm = confirmer(args.yes)?;
    if !confirm.confirm(REMOVE_TRACK_PROMPT) {
        eprintln!("cancelled; nothing was sent");
        return Ok(());
    }

    let actions = LibraryActions::new(ctx.events.clone());
    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let removal = actions
        .remove_playlist_track(ctx.api.as_ref(), playlist_id, args.track_id.trim())
        .await;
    render_pending_events(&mut stream, format)?;
    let removal = removal.map_err(client_failure)?;
    if let Some(image) = removal.new_image_url.as_deref() {
        tracing::debug!(playlist_id, image, "playlist cover changed");
    }

    if !removal.playlist_is_empty() {
        return Ok(());
    }
    let delete = args.delete_if_empty || (!args.yes && confirm.confirm(EMPTY_PLAYLIST_PROMPT));
    if !delete {
        return Ok(());
    }
    let result = actions.delete_playlist(ctx.api.as_ref(), playlist_id).await;
    render_pending_events(&mut stream, format)?;
    result.map_err(client_failure)
}

pub(crate) async fn handle_playlist_reorder(
    ctx: &AppContext,
    args: PlaylistReorderArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let result = LibraryActions::new(ctx.events.clone())
        .reorder_playlist_item(ctx.api.as_ref(), args.playlist_id.trim(), args.from, args.to)
        .await;
    render_pending_events(&mut stream, format)?;
    result.map_err(client_failure)
}

pub(crate) async fn handle_playlist_save_order(
    ctx: &AppContext,
    args: PlaylistSaveOrderArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let playlist_ids = normalize_ids(&args.playlist_ids, "playlist id")?;
    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let result = LibraryActions::new(ctx.events.clone())
        .save_playlist_order(ctx.api.as_ref(), playlist_ids)
        .await;
    render_pending_events(&mut stream, format)?;
    result.map_err(client_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context_with;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn list_renders_playlists() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/playlists");
            then.status(200).json_body(json!([
                {"id": "pl1", "name": "Mix", "image_url": null, "total_tracks": 3}
            ]));
        });

        let ctx = context_with(&server);
        handle_playlist_list(&ctx, OutputFormat::Table)
            .await
            .expect("list succeeds");
        mock.assert();
    }

    #[tokio::test]
    async fn add_sends_every_track_in_one_request() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/playlist/add_tracks")
                .json_body(json!({"track_ids": ["t1", "t2", "t3"], "playlist_id": "pl1"}));
            then.status(200)
                .json_body(json!({"success": true, "added": 2, "skipped": 1}));
        });

        let ctx = context_with(&server);
        handle_playlist_add(
            &ctx,
            PlaylistAddArgs {
                playlist_id: "pl1".to_string(),
                track_ids: vec!["t1".to_string(), "t2".to_string(), "t3".to_string()],
            },
            OutputFormat::Json,
        )
        .await
        .expect("tracks added");
        mock.assert();
    }

    #[tokio::test]
    async fn create_rejects_blank_name_without_a_request() {
        let server = MockServer::start_async().await;
        let ctx = context_with(&server);
        let err = handle_playlist_create(
            &ctx,
            PlaylistCreateArgs {
                name: "   ".to_string(),
                track_ids: vec!["t1".to_string()],
            },
            OutputFormat::Table,
        )
        .await
        .expect_err("blank name");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn unchanged_rename_sends_nothing() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/playlist/rename");
            then.status(200).json_body(json!({"success": true}));
        });

        let ctx = context_with(&server);
        handle_playlist_rename(
            &ctx,
            PlaylistRenameArgs {
                playlist_id: "pl1".to_string(),
                new_name: " Mix ".to_string(),
                current_name: Some("Mix".to_string()),
            },
            OutputFormat::Table,
        )
        .await
        .expect("no-op rename");
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn removing_last_track_deletes_playlist_when_asked() {
        let server = MockServer::start_async().await;
        let remove = server.mock(|when, then| {
            when.method(POST)
                .path("/api/playlist/track/delete")
                .json_body(json!({"playlist_id": "pl1", "track_id": "t1"}));
            then.status(200)
                .json_body(json!({"success": true, "new_image_url": "", "remaining_tracks": 0}));
        });
        let delete = server.mock(|when, then| {
            when.method(POST)
                .path("/api/playlist/delete")
                .json_body(json!({"playlist_id": "pl1"}));
            then.status(200).json_body(json!({"success": true}));
        });

        let ctx = context_with(&server);
        handle_playlist_remove_track(
            &ctx,
            PlaylistRemoveTrackArgs {
                playlist_id: "pl1".to_string(),
                track_id: "t1".to_string(),
                yes: true,
                delete_if_empty: true,
            },
            OutputFormat::Table,
        )
        .await
        .expect("removal and delete succeed");
        remove.assert();
        delete.assert();
    }

    #[tokio::test]
    async fn yes_alone_keeps_empty_playlist() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/playlist/track/delete");
            then.status(200)
                .json_body(json!({"success": true, "remaining_tracks": 0}));
        });
        let delete = server.mock(|when, then| {
            when.method(POST).path("/api/playlist/delete");
            then.status(200).json_body(json!({"success": true}));
        });

        let ctx = context_with(&server);
        handle_playlist_remove_track(
            &ctx,
            PlaylistRemoveTrackArgs {
                playlist_id: "pl1".to_string(),
                track_id: "t1".to_string(),
                yes: true,
                delete_if_empty: false,
            },
            OutputFormat::Table,
        )
        .await
        .expect("removal succeeds");
        assert_eq!(delete.hits(), 0);
    }

    #[tokio::test]
    async fn reorder_to_same_index_is_a_validation_error() {
        let server = MockServer::start_async().await;
        let ctx = context_with(&server);
        let err = handle_playlist_reorder(
            &ctx,
            PlaylistReorderArgs {
                playlist_id: "pl1".to_string(),
                from: 2,
                to: 2,
            },
            OutputFormat::Table,
        )
        .await
        .expect_err("no move");
        assert_eq!(err.display_message(), "playlist.reorder_items: item did not move");
    }

    #[tokio::test]
    async fn failed_delete_is_reported() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/playlist/delete");
            then.status(500)
                .json_body(json!({"success": false, "error": "Spotify API error"}));
        });

        let ctx = context_with(&server);
        let mut stream = ctx.events.subscribe(None);
        let err = handle_playlist_delete(
            &ctx,
            PlaylistDeleteArgs {
                playlist_id: "pl1".to_string(),
                yes: true,
            },
            OutputFormat::Table,
        )
        .await
        .expect_err("delete rejected");
        assert_eq!(err.exit_code(), 3);
        let kinds: Vec<&str> = stream.drain().iter().map(|envelope| envelope.event.kind()).collect();
        assert_eq!(kinds, vec!["notification"]);
    }
}
