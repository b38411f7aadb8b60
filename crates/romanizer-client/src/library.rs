//! Client-side model of the library page lists.
//!
//! The search page shows two lists of cached songs: favorites and history.
//! Bulk favorite changes move rows between them after the server confirms,
//! and each list shows an empty-state placeholder when it has no rows.

use std::fmt::{self, Display, Formatter};

/// Prefix the backend uses for track cache keys.
pub const TRACK_CACHE_KEY_PREFIX: &str = "track_";

/// Empty-state title of the favorites list.
pub const FAVORITES_EMPTY_TITLE: &str = "No Favorite Songs Yet";
/// Empty-state hint of the favorites list.
pub const FAVORITES_EMPTY_TEXT: &str =
    "Click the star icon on any song in your history to add it here.";
/// Empty-state title of the history list.
pub const HISTORY_EMPTY_TITLE: &str = "Your History is Empty";
/// Empty-state hint of the history list.
pub const HISTORY_EMPTY_TEXT: &str =
    "Search for a song and view its details to start building your history.";

/// Cache key for a track id.
#[must_use]
pub fn track_cache_key(track_id: &str) -> String {
    format!("{TRACK_CACHE_KEY_PREFIX}{track_id}")
}

/// Which list a row lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Favorited songs.
    Favorites,
    /// Recently viewed songs.
    History,
}

impl ListKind {
    /// Empty-state title.
    #[must_use]
    pub const fn empty_title(self) -> &'static str {
        match self {
            Self::Favorites => FAVORITES_EMPTY_TITLE,
            Self::History => HISTORY_EMPTY_TITLE,
        }
    }

    /// Empty-state hint text.
    #[must_use]
    pub const fn empty_text(self) -> &'static str {
        match self {
            Self::Favorites => FAVORITES_EMPTY_TEXT,
            Self::History => HISTORY_EMPTY_TEXT,
        }
    }
}

impl Display for ListKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Favorites => "favorites",
            Self::History => "history",
        })
    }
}

/// One rendered song row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRow {
    /// Track identifier (selection id).
    pub track_id: String,
    /// Cache key sent to favorite endpoints.
    pub cache_key: String,
    /// Display title.
    pub title: String,
    /// Favorite marker on the row's star button.
    pub is_favorite: bool,
}

impl LibraryRow {
    /// Row for `track_id` using the conventional cache key.
    #[must_use]
    pub fn new(track_id: impl Into<String>, title: impl Into<String>, is_favorite: bool) -> Self {
        let track_id = track_id.into();
        Self {
            cache_key: track_cache_key(&track_id),
            track_id,
            title: title.into(),
            is_favorite,
        }
    }
}

/// One list container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryList {
    kind: ListKind,
    rows: Vec<LibraryRow>,
    placeholder: bool,
}

impl LibraryList {
    fn new(kind: ListKind, rows: Vec<LibraryRow>) -> Self {
        let placeholder = rows.is_empty();
        Self {
            kind,
            rows,
            placeholder,
        }
    }

    /// Which list this is.
    #[must_use]
    pub const fn kind(&self) -> ListKind {
        self.kind
    }

    /// Rows top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[LibraryRow] {
        &self.rows
    }

    /// Whether the empty-state placeholder is shown.
    #[must_use]
    pub const fn shows_placeholder(&self) -> bool {
        self.placeholder
    }

    fn refresh_placeholder(&mut self) {
        self.placeholder = self.rows.is_empty();
    }
}

/// The favorites and history lists of the library page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryView {
    favorites: LibraryList,
    history: LibraryList,
}

impl LibraryView {
    /// Build the view from rendered rows.
    #[must_use]
    pub fn new(favorites: Vec<LibraryRow>, history: Vec<LibraryRow>) -> Self {
        Self {
            favorites: LibraryList::new(ListKind::Favorites, favorites),
            history: LibraryList::new(ListKind::History, history),
        }
    }

    /// Borrow one list.
    #[must_use]
    pub const fn list(&self, kind: ListKind) -> &LibraryList {
        match kind {
            ListKind::Favorites => &self.favorites,
            ListKind::History => &self.history,
        }
    }

    /// Find the list and position holding `track_id`.
    #[must_use]
    pub fn locate(&self, track_id: &str) -> Option<(ListKind, usize)> {
        [&self.favorites, &self.history].into_iter().find_map(|list| {
            list.rows
                .iter()
                .position(|row| row.track_id == track_id)
                .map(|index| (list.kind, index))
        })
    }

    /// Borrow the row for `track_id`.
    #[must_use]
    pub fn row(&self, track_id: &str) -> Option<&LibraryRow> {
        let (kind, index) = self.locate(track_id)?;
        self.list(kind).rows.get(index)
    }

    /// Cache key for `track_id`, falling back to the conventional key when
    /// the row is not rendered.
    #[must_use]
    pub fn cache_key_for(&self, track_id: &str) -> String {
        self.row(track_id)
            .map_or_else(|| track_cache_key(track_id), |row| row.cache_key.clone())
    }

    /// Every rendered track id, favorites first.
    #[must_use]
    pub fn track_ids(&self) -> Vec<String> {
        self.favorites
            .rows
            .iter()
            .chain(self.history.rows.iter())
            .map(|row| row.track_id.clone())
            .collect()
    }

    /// Detach the row for `track_id`, set its favorite marker and prepend it
    /// to `target`. Returns `false` when the row is not rendered.
    /// Placeholders are not refreshed; call [`Self::refresh_placeholders`].
    pub fn move_to_front(&mut self, track_id: &str, target: ListKind, favorite: bool) -> bool {
        let Some(mut row) = self.detach(track_id) else {
            return false;
        };
        row.is_favorite = favorite;
        self.list_mut(target).rows.insert(0, row);
        true
    }

    /// Remove the row for `track_id` and refresh its list's placeholder.
    pub fn remove(&mut self, track_id: &str) -> Option<LibraryRow> {
        let (kind, _) = self.locate(track_id)?;
        let row = self.detach(track_id);
        self.list_mut(kind).refresh_placeholder();
        row
    }

    /// Recompute both empty-state placeholders.
    pub fn refresh_placeholders(&mut self) {
        self.favorites.refresh_placeholder();
        self.history.refresh_placeholder();
    }

    fn detach(&mut self, track_id: &str) -> Option<LibraryRow> {
        let (kind, index) = self.locate(track_id)?;
        Some(self.list_mut(kind).rows.remove(index))
    }

    const fn list_mut(&mut self, kind: ListKind) -> &mut LibraryList {
        match kind {
            ListKind::Favorites => &mut self.favorites,
            ListKind::History => &mut self.history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> LibraryView {
        LibraryView::new(
            vec![LibraryRow::new("f1", "Fav one", true)],
            vec![
                LibraryRow::new("h1", "History one", false),
                LibraryRow::new("h2", "History two", false),
            ],
        )
    }

    #[test]
    fn cache_keys_follow_backend_convention() {
        let view = view();
        assert_eq!(view.cache_key_for("h1"), "track_h1");
        assert_eq!(view.cache_key_for("not-rendered"), "track_not-rendered");
    }

    #[test]
    fn move_to_front_prepends_and_sets_marker() {
        let mut view = view();
        assert!(view.move_to_front("h2", ListKind::Favorites, true));
        view.refresh_placeholders();

        let favorites = view.list(ListKind::Favorites).rows();
        assert_eq!(favorites[0].track_id, "h2");
        assert!(favorites[0].is_favorite);
        assert_eq!(view.locate("h2"), Some((ListKind::Favorites, 0)));
        assert_eq!(view.list(ListKind::History).rows().len(), 1);
        assert!(!view.move_to_front("ghost", ListKind::History, false));
    }

    #[test]
    fn placeholders_track_emptiness() {
        let mut view = view();
        assert!(!view.list(ListKind::Favorites).shows_placeholder());
        view.move_to_front("f1", ListKind::History, false);
        view.refresh_placeholders();
        assert!(view.list(ListKind::Favorites).shows_placeholder());
        assert_eq!(ListKind::Favorites.empty_title(), FAVORITES_EMPTY_TITLE);

        let removed = view.remove("h1").expect("row removed");
        assert_eq!(removed.title, "History one");
        assert!(!view.list(ListKind::History).shows_placeholder());
        assert_eq!(view.track_ids(), vec!["f1".to_string(), "h2".to_string()]);
    }

    #[test]
    fn empty_view_starts_with_placeholders() {
        let view = LibraryView::new(Vec::new(), Vec::new());
        assert!(view.list(ListKind::Favorites).shows_placeholder());
        assert!(view.list(ListKind::History).shows_placeholder());
        assert_eq!(ListKind::History.empty_title(), HISTORY_EMPTY_TITLE);
    }
}
