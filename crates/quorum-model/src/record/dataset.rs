use serde::{Deserialize, Serialize};

use crate::{DatasetId, Progress, TaskId};

/// Dataset-level completion.
///
/// The stored row also holds a `counted` map of task id to `true`, one entry
/// per member task already added to `progress.current`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub dataset_id: DatasetId,
    /// `current` counts member tasks that moved to the finished table.
    pub progress: Progress,
    #[serde(default)]
    pub finished: bool,
}

/// Row of a dataset's own sub-table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetTask {
    pub task_id: TaskId,
    #[serde(default)]
    pub finished: bool,
}
