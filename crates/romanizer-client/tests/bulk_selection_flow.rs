//! Selection snapshots feeding bulk mutations on the library page.

use romanizer_api_models::{FavoritesBulkRequest, MutationResponse};
use romanizer_client::library::{FAVORITES_EMPTY_TITLE, ListKind};
use romanizer_client::{
    AlwaysConfirm, BulkAction, BulkError, BulkMutationReconciler, LibraryActions, LibraryRow,
    LibraryView, MutationRequest, SelectionCoordinator,
};
use romanizer_events::{EventBus, NotificationLevel};
use romanizer_test_support::assert::{count_kind, drain_events, single_notification};
use romanizer_test_support::fixtures::{accepted, rejected, transport_error};
use romanizer_test_support::mocks::ScriptedApi;

fn library() -> LibraryView {
    LibraryView::new(
        vec![LibraryRow::new("fav", "Already favorite", true)],
        vec![
            LibraryRow::new("a", "Song A", false),
            LibraryRow::new("b", "Song B", false),
            LibraryRow::new("c", "Song C", false),
        ],
    )
}

#[tokio::test]
async fn rejected_bulk_favorite_changes_nothing() {
    let api = ScriptedApi::new();
    api.push_mutation(Ok(rejected(None)));
    let events = EventBus::new();
    let mut view = library();
    let mut selection = SelectionCoordinator::new(view.track_ids(), events.clone());
    for id in ["a", "b", "c"] {
        selection.toggle(id).expect("rendered id");
    }
    let before_view = view.clone();
    let before_selection = selection.snapshot();
    let mut stream = events.subscribe(events.last_event_id());

    let reconciler = BulkMutationReconciler::new(events.clone());
    let result = reconciler
        .apply(
            &api,
            &mut AlwaysConfirm,
            &mut view,
            &BulkAction::Favorite,
            &selection.snapshot(),
        )
        .await;

    assert!(matches!(result, Err(BulkError::Failed { .. })));
    assert_eq!(view, before_view);
    assert_eq!(selection.snapshot(), before_selection);
    assert_eq!(api.mutations().len(), 1);

    let published = drain_events(&mut stream);
    assert_eq!(
        single_notification(&published, NotificationLevel::Error),
        "Error: Bulk action failed on the server."
    );
    assert_eq!(count_kind(&published, "bulk_applied"), 0);
}

#[tokio::test]
async fn unfavorite_moves_rows_back_and_restores_placeholder() {
    let api = ScriptedApi::new();
    api.push_mutation(Ok(accepted()));
    let events = EventBus::new();
    let mut view = library();
    let mut selection = SelectionCoordinator::new(view.track_ids(), events.clone());
    selection.toggle("fav").expect("rendered id");

    let reconciler = BulkMutationReconciler::new(events.clone());
    let mut asked = 0;
    let mut confirm = |prompt: &str| {
        asked += 1;
        prompt == "Are you sure you want to unfavorite 1 selected song(s)?"
    };
    let report = reconciler
        .apply(
            &api,
            &mut confirm,
            &mut view,
            &BulkAction::Unfavorite,
            &selection.snapshot(),
        )
        .await
        .expect("accepted");

    assert_eq!(asked, 1);
    assert_eq!(report.moved, 1);
    assert_eq!(
        api.mutations(),
        vec![MutationRequest::RemoveFavorites(FavoritesBulkRequest {
            cache_keys: vec!["track_fav".to_string()],
        })]
    );
    assert!(view.list(ListKind::Favorites).shows_placeholder());
    assert_eq!(ListKind::Favorites.empty_title(), FAVORITES_EMPTY_TITLE);
    let top = &view.list(ListKind::History).rows()[0];
    assert_eq!(top.track_id, "fav");
    assert!(!top.is_favorite);
    assert!(selection.is_selected("fav"));
}

#[tokio::test]
async fn snapshot_is_fixed_at_confirmation() {
    let api = ScriptedApi::new();
    api.push_mutation(Ok(MutationResponse {
        added: Some(2),
        ..accepted()
    }));
    let events = EventBus::new();
    let mut view = library();
    let mut selection = SelectionCoordinator::new(view.track_ids(), events.clone());
    selection.toggle("a").expect("rendered id");
    selection.toggle("c").expect("rendered id");
    let snapshot = selection.snapshot();
    selection.toggle("b").expect("rendered id");

    let reconciler = BulkMutationReconciler::new(events);
    let report = reconciler
        .apply(
            &api,
            &mut AlwaysConfirm,
            &mut view,
            &BulkAction::AddToPlaylist {
                playlist_id: "pl".to_string(),
            },
            &snapshot,
        )
        .await
        .expect("accepted");

    assert_eq!(report.count, 2);
    assert_eq!(report.message, "Added 2 new song(s).");
    match api.mutations().as_slice() {
        [MutationRequest::AddTracks(body)] => {
            assert_eq!(body.track_ids, vec!["a".to_string(), "c".to_string()]);
        }
        other => panic!("unexpected requests {other:?}"),
    }
}

#[tokio::test]
async fn cache_delete_keeps_selection_consistent_with_rows() {
    let api = ScriptedApi::new();
    api.push_mutation(Ok(accepted()))
        .push_mutation(Err(transport_error("cache.delete")));
    let events = EventBus::new();
    let mut view = library();
    let mut selection = SelectionCoordinator::new(view.track_ids(), events.clone());
    selection.select_all_or_clear();
    let actions = LibraryActions::new(events.clone());

    actions
        .delete_cache_item(&api, &mut view, &mut selection, "b")
        .await
        .expect("deleted");
    assert_eq!(selection.universe_len(), 3);
    assert!(selection.all_selected());
    assert!(!selection.is_selected("b"));

    let mut stream = events.subscribe(events.last_event_id());
    let failed = actions
        .delete_cache_item(&api, &mut view, &mut selection, "c")
        .await;
    assert!(failed.is_err());
    assert!(view.row("c").is_some());
    assert_eq!(
        single_notification(&drain_events(&mut stream), NotificationLevel::Error),
        "An error occurred. Please try again."
    );
}
