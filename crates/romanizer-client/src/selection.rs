//! Multi-item selection on list pages.

use std::collections::BTreeSet;

use romanizer_events::{Event, EventBus};
use thiserror::Error;
use tracing::debug;

/// Label shown when pressing the toggle would select everything.
pub const SELECT_ALL_LABEL: &str = "Select All";
/// Label shown when pressing the toggle would clear the selection.
pub const DESELECT_ALL_LABEL: &str = "Deselect All";

/// Errors raised by selection changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// The id is not rendered on this page.
    #[error("item is not selectable on this page")]
    UnknownItem {
        /// Rejected identifier.
        item_id: String,
    },
}

/// Enablement of selection-dependent controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionControls {
    /// Number of selected items.
    pub selected_count: usize,
    /// At least one item is selected.
    pub has_selection: bool,
    /// Every item on a non-empty page is selected.
    pub all_selected: bool,
    /// "Add to playlist" is clickable.
    pub add_to_playlist_enabled: bool,
    /// Bulk favorite is clickable.
    pub bulk_favorite_enabled: bool,
    /// Bulk unfavorite is clickable.
    pub bulk_unfavorite_enabled: bool,
    /// Text of the select-all toggle, naming the action it will perform.
    pub select_all_label: &'static str,
}

/// Selection state over the fixed, ordered set of items rendered on a page.
#[derive(Debug)]
pub struct SelectionCoordinator {
    universe: Vec<String>,
    known: BTreeSet<String>,
    selected: BTreeSet<String>,
    events: EventBus,
}

impl SelectionCoordinator {
    /// Create an empty selection over `universe`. Duplicate ids keep their
    /// first position.
    pub fn new<I, S>(universe: I, events: EventBus) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut coordinator = Self {
            universe: Vec::new(),
            known: BTreeSet::new(),
            selected: BTreeSet::new(),
            events,
        };
        coordinator.set_universe(universe);
        coordinator
    }

    /// Flip membership of `item_id`. Returns whether it is selected afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownItem`] when `item_id` is not on the page.
    pub fn toggle(&mut self, item_id: &str) -> Result<bool, SelectionError> {
        self.ensure_known(item_id)?;
        let now_selected = if self.selected.remove(item_id) {
            false
        } else {
            self.selected.insert(item_id.to_string());
            true
        };
        debug!(item_id, now_selected, "selection toggled");
        self.publish_change();
        Ok(now_selected)
    }

    /// Set membership of `item_id` explicitly, as a checkbox change does.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownItem`] when `item_id` is not on the page.
    pub fn set_selected(&mut self, item_id: &str, selected: bool) -> Result<(), SelectionError> {
        self.ensure_known(item_id)?;
        let changed = if selected {
            self.selected.insert(item_id.to_string())
        } else {
            self.selected.remove(item_id)
        };
        if changed {
            self.publish_change();
        }
        Ok(())
    }

    /// The single select-all control: clears the selection when every item
    /// is selected, otherwise selects every item.
    pub fn select_all_or_clear(&mut self) -> SelectionControls {
        if self.selected.len() == self.universe.len() {
            if self.selected.is_empty() {
                return self.controls();
            }
            self.selected.clear();
        } else {
            self.selected = self.known.clone();
        }
        self.publish_change();
        self.controls()
    }

    /// Drop every selection.
    pub fn clear(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.publish_change();
        }
    }

    /// Replace the rendered items, keeping selections whose rows remain.
    pub fn replace_universe<I, S>(&mut self, universe: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.selected.len();
        self.set_universe(universe);
        self.selected.retain(|id| self.known.contains(id));
        if self.selected.len() != before {
            debug!(dropped = before - self.selected.len(), "selection pruned to rendered items");
        }
        self.publish_change();
    }

    /// Whether `item_id` is selected.
    #[must_use]
    pub fn is_selected(&self, item_id: &str) -> bool {
        self.selected.contains(item_id)
    }

    /// Number of selected items.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Number of selectable items.
    #[must_use]
    pub fn universe_len(&self) -> usize {
        self.universe.len()
    }

    /// At least one item is selected.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Every item on a non-empty page is selected.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        !self.universe.is_empty() && self.selected.len() == self.universe.len()
    }

    /// Selected ids in page order, captured for a bulk action.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.universe
            .iter()
            .filter(|id| self.selected.contains(*id))
            .cloned()
            .collect()
    }

    /// Derived control state.
    #[must_use]
    pub fn controls(&self) -> SelectionControls {
        let has_selection = self.has_selection();
        let all_selected = self.all_selected();
        SelectionControls {
            selected_count: self.selected.len(),
            has_selection,
            all_selected,
            add_to_playlist_enabled: has_selection,
            bulk_favorite_enabled: has_selection,
            bulk_unfavorite_enabled: has_selection,
            select_all_label: if all_selected {
                DESELECT_ALL_LABEL
            } else {
                SELECT_ALL_LABEL
            },
        }
    }

    fn set_universe<I, S>(&mut self, universe: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.universe.clear();
        self.known.clear();
        for id in universe {
            let id = id.into();
            if self.known.insert(id.clone()) {
                self.universe.push(id);
            }
        }
    }

    fn ensure_known(&self, item_id: &str) -> Result<(), SelectionError> {
        if self.known.contains(item_id) {
            Ok(())
        } else {
            Err(SelectionError::UnknownItem {
                item_id: item_id.to_string(),
            })
        }
    }

    fn publish_change(&self) {
        self.events.publish(Event::SelectionChanged {
            selected: self.selected.len(),
            total: self.universe.len(),
        });
    }
}
