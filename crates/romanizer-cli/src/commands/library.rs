//! Favorites and history page actions.

use romanizer_client::{
    BulkAction, BulkError, BulkMutationReconciler, BulkReport, LibraryActions, LibraryRow,
    LibraryView, SelectionCoordinator,
};
use romanizer_client::library::{TRACK_CACHE_KEY_PREFIX, track_cache_key};

use crate::cli::{CacheDeleteArgs, FavoriteToggleArgs, FavoritesArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, client_failure, confirmer, normalize_ids};
use crate::output::{render_bulk_report, render_outcome, render_pending_events};

/// Favorite (`favorite = true`) or unfavorite every listed track in one
/// request. The tracks are rendered as rows on the opposite list, selected
/// together and handed to the bulk reconciler.
pub(crate) async fn handle_favorites(
    ctx: &AppContext,
    args: FavoritesArgs,
    favorite: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let track_ids = normalize_ids(&args.track_ids, "track id")?;
    let rows: Vec<LibraryRow> = track_ids
        .iter()
        .map(|id| LibraryRow::new(id.clone(), id.clone(), !favorite))
        .collect();
    let (mut view, action) = if favorite {
        (LibraryView::new(Vec::new(), rows), BulkAction::Favorite)
    } else {
        (LibraryView::new(rows, Vec::new()), BulkAction::Unfavorite)
    };

    let mut selection = SelectionCoordinator::new(view.track_ids(), ctx.events.clone());
    selection.select_all_or_clear();
    let snapshot = selection.snapshot();

    let mut confirm = confirmer(args.yes)?;
    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let result = BulkMutationReconciler::new(ctx.events.clone())
        .apply(ctx.api.as_ref(), confirm.as_mut(), &mut view, &action, &snapshot)
        .await;
    render_pending_events(&mut stream, format)?;
    finish_bulk(result, format)
}

/// Flip one track's favorite state.
pub(crate) async fn handle_favorite_toggle(
    ctx: &AppContext,
    args: FavoriteToggleArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let track_id = args.track_id.trim();
    if track_id.is_empty() {
        return Err(CliError::validation("track id must not be empty"));
    }
    let row = LibraryRow::new(track_id, track_id, args.favorited);
    let mut view = if args.favorited {
        LibraryView::new(vec![row], Vec::new())
    } else {
        LibraryView::new(Vec::new(), vec![row])
    };

    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let result = LibraryActions::new(ctx.events.clone())
        .toggle_favorite(ctx.api.as_ref(), &mut view, track_id)
        .await;
    render_pending_events(&mut stream, format)?;
    result.map_err(client_failure)?;
    Ok(())
}

/// Remove one track's cached content. Accepts either the bare track id or
/// its `track_` cache key.
pub(crate) async fn handle_cache_delete(
    ctx: &AppContext,
    args: CacheDeleteArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let track_id = cache_target(&args.track)?;
    let mut view = LibraryView::new(Vec::new(), vec![LibraryRow::new(track_id, track_id, false)]);
    let mut selection = SelectionCoordinator::new(view.track_ids(), ctx.events.clone());

    let mut stream = ctx.events.subscribe(ctx.events.last_event_id());
    let result = LibraryActions::new(ctx.events.clone())
        .delete_cache_item(ctx.api.as_ref(), &mut view, &mut selection, track_id)
        .await;
    render_pending_events(&mut stream, format)?;
    let removed = result.map_err(client_failure)?;
    let cache_key = removed.map_or_else(|| track_cache_key(track_id), |row| row.cache_key);
    render_outcome(
        "cache.delete",
        &format!("Removed {cache_key} from the cache."),
        format,
    )
}

fn cache_target(input: &str) -> CliResult<&str> {
    let trimmed = input.trim();
    let track_id = trimmed
        .strip_prefix(TRACK_CACHE_KEY_PREFIX)
        .unwrap_or(trimmed);
    if track_id.is_empty() {
        return Err(CliError::validation("track id must not be empty"));
    }
    Ok(track_id)
}

/// Map a bulk outcome onto the CLI result. A declined prompt is not an error.
pub(crate) fn finish_bulk(result: Result<BulkReport, BulkError>, format: OutputFormat) -> CliResult<()> {
    match result {
        Ok(report) => render_bulk_report(&report, format),
        Err(BulkError::Cancelled) => {
            eprintln!("cancelled; nothing was sent");
            Ok(())
        }
        Err(BulkError::EmptySelection) => Err(CliError::validation("no tracks selected")),
        Err(BulkError::Invalid { reason }) => Err(CliError::validation(reason)),
        Err(BulkError::Failed { source, .. }) => Err(client_failure(source)),
    }
}
