use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-class occurrence counters of an unfinished task.
///
/// Entries keep the order in which they were stored. That order is the
/// enumeration order used when rationing classes, so it must survive a round
/// trip through the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassCounts(IndexMap<String, u32>);

impl ClassCounts {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, class: &str) -> Option<u32> {
        self.0.get(class).copied()
    }

    pub fn get_mut(&mut self, class: &str) -> Option<&mut u32> {
        self.0.get_mut(class)
    }

    /// Insert or overwrite a counter. New classes go to the end.
    pub fn insert(&mut self, class: impl Into<String>, count: u32) {
        self.0.insert(class.into(), count);
    }

    /// Iterate `(class, count)` in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for ClassCounts {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Classes exposed to a labeler, each with the labeler's answer.
///
/// Handed out with every value `false`; the labeler flips the classes they
/// choose to `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassSelection(IndexMap<String, bool>);

impl ClassSelection {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.contains_key(class)
    }

    pub fn get(&self, class: &str) -> Option<bool> {
        self.0.get(class).copied()
    }

    /// Expose a class, unanswered.
    pub fn offer(&mut self, class: impl Into<String>) {
        self.0.insert(class.into(), false);
    }

    pub fn set(&mut self, class: impl Into<String>, chosen: bool) {
        self.0.insert(class.into(), chosen);
    }

    /// Iterate exposed class names in the order they were offered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate class names the labeler picked.
    pub fn chosen(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter(|(_, v)| **v).map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for ClassSelection {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
