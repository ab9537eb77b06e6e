//! State of the interactive `browse` view.

use std::collections::BTreeMap;

use ratatui::widgets::ListState;

use crate::error::StorageResult;
use crate::item::Item;
use crate::recommend::{recommend_from_store, LatestRecommender};
use crate::store::JsonItemStore;

pub struct App {
    store: JsonItemStore,
    /// The `latest` recommendation, in display order.
    pub items: Vec<Item>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Outcome of the last action.
    pub status: String,
}

impl App {
    pub fn new(store: JsonItemStore, items: Vec<Item>) -> Self {
        let mut app = Self {
            store,
            items,
            list_state: ListState::default(),
            quit: false,
            status: "Ready".into(),
        };
        app.select_first();
        app
    }

    /// Load the `latest` recommendation from `store`.
    pub fn load(store: JsonItemStore, limit: usize) -> StorageResult<Self> {
        let result = recommend_from_store(&store, &LatestRecommender, limit, BTreeMap::new())?;
        Ok(Self::new(store, result.items))
    }

    pub fn selected(&self) -> Option<&Item> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }

    /// Flip the selected item's `seen` flag and write it to the store.
    ///
    /// The item keeps its place in the list until the next `browse`.
    pub fn toggle_seen(&mut self) {
        let Some(index) = self.list_state.selected() else {
            return;
        };
        let Some(item) = self.items.get(index) else {
            return;
        };

        let updated = item.with_seen(!item.seen());
        match self.store.save_many([&updated]) {
            Ok(()) => {
                self.status = format!(
                    "Marked {} as {}",
                    updated.item_id(),
                    if updated.seen() { "seen" } else { "unseen" }
                );
                self.items[index] = updated;
            }
            Err(e) => {
                tracing::warn!("failed to save seen flag: {e}");
                self.status = format!("Error: {e}");
            }
        }
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}
