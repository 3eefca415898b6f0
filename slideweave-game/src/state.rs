//! Per-session game state: owned items and named visibility flags.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Inventory plus visibility flags. Created once per session and only
/// mutated through the methods below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameState {
    #[serde(default)]
    inventory: BTreeSet<String>,
    #[serde(default)]
    visibility: BTreeMap<String, bool>,
}

impl GameState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item; adding an owned item is a no-op.
    pub fn add_item(&mut self, id: &str) {
        if self.inventory.insert(id.to_string()) {
            log::debug!("item added: {id}");
        }
    }

    /// Remove an item if present.
    pub fn remove_item(&mut self, id: &str) {
        if self.inventory.remove(id) {
            log::debug!("item removed: {id}");
        }
    }

    #[must_use]
    pub fn check_for_item(&self, id: &str) -> bool {
        self.inventory.contains(id)
    }

    /// Load-time insert used when seeding from the catalog. Overwrites.
    pub fn add_visibility(&mut self, key: &str, value: bool) {
        self.visibility.insert(key.to_string(), value);
    }

    pub fn set_visibility(&mut self, key: &str, value: bool) {
        self.visibility.insert(key.to_string(), value);
    }

    /// Flip a flag. A missing flag counts as `false`, so it becomes `true`.
    pub fn change_visibility(&mut self, key: &str) {
        let flag = self.visibility.entry(key.to_string()).or_insert(false);
        *flag = !*flag;
    }

    /// Current value of a flag; missing flags read as `false`.
    #[must_use]
    pub fn check_visibility(&self, key: &str) -> bool {
        self.visibility.get(key).copied().unwrap_or(false)
    }

    /// Explicit value of a flag, `None` when it was never set.
    #[must_use]
    pub fn visibility(&self, key: &str) -> Option<bool> {
        self.visibility.get(key).copied()
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.inventory.iter().map(String::as_str)
    }

    pub fn flags(&self) -> impl Iterator<Item = (&str, bool)> {
        self.visibility.iter().map(|(key, value)| (key.as_str(), *value))
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.inventory.len()
    }

    #[must_use]
    pub fn flag_count(&self) -> usize {
        self.visibility.len()
    }
}
