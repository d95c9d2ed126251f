use serde::{Deserialize, Serialize};

/// Completion counter shared by tasks and datasets.
///
/// For a task, `current` counts classes that reached their occurrence target and
/// `total` is the number of classes. For a dataset, `current` counts finished
/// tasks and `total` is the number of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
}

impl Progress {
    pub fn new(current: u32, total: u32) -> Self {
        Self { current, total }
    }

    /// Returns `true` once `current` has reached `total`.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current == self.total
    }

    /// Returns `true` if `current` went past `total`.
    ///
    /// This is never produced by the aggregator; seeing it means the record was
    /// written by something else.
    #[inline]
    pub fn is_overshot(&self) -> bool {
        self.current > self.total
    }
}
