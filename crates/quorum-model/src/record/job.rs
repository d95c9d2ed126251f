use serde::{Deserialize, Serialize};

use crate::{
    AssignedTask, ClassSelection, DeveloperId, JobId, LabelerId, LabelingMethod, TaskId,
    TaskType, TimestampMs,
};

/// Write-once record of one labeler's attempt at one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: JobId,
    pub labeler_id: LabelerId,
    pub task_id: TaskId,
    pub developer_id: DeveloperId,
    /// Exposed classes with the labeler's answers.
    pub class: ClassSelection,
    pub begin_timestamp: Option<TimestampMs>,
    pub end_timestamp: Option<TimestampMs>,
    pub stopped_by_timer: Option<bool>,
    pub labeling_method: LabelingMethod,
    #[serde(default)]
    pub skipped: bool,
}

impl From<&AssignedTask> for Job {
    fn from(task: &AssignedTask) -> Self {
        Self {
            job_id: task.job_id.clone(),
            labeler_id: task.labeler_id.clone(),
            task_id: task.task_id.clone(),
            developer_id: task.developer_id.clone(),
            class: task.class.clone(),
            begin_timestamp: task.begin_timestamp,
            end_timestamp: task.end_timestamp,
            stopped_by_timer: task.stopped_by_timer,
            labeling_method: task.labeling_method,
            skipped: task.skipped,
        }
    }
}

/// Marks that a labeler has been given a task, so it is not offered again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelerTask {
    pub labeler_id: LabelerId,
    pub task_id: TaskId,
    pub job_id: JobId,
    #[serde(rename = "type")]
    pub kind: TaskType,
}

impl From<&AssignedTask> for LabelerTask {
    fn from(task: &AssignedTask) -> Self {
        Self {
            labeler_id: task.labeler_id.clone(),
            task_id: task.task_id.clone(),
            job_id: task.job_id.clone(),
            kind: task.kind.clone(),
        }
    }
}
