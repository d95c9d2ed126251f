use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ClassCounts, ClassSelection, DatasetId, DeveloperId, JobId, LabelerId, LabelingMethod,
    Progress, TaskId, TaskType, TimestampMs,
};

/// A task as stored in the unfinished and finished tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: TaskId,
    #[serde(rename = "type")]
    pub kind: TaskType,
    /// Content to label; opaque to the service.
    #[serde(default)]
    pub data: Value,
    /// Whether the labeler may pick more than one class.
    #[serde(default)]
    pub multiclass: bool,
    #[serde(default)]
    pub instructions: String,
    /// Occurrence counter per class.
    pub class: ClassCounts,
    pub progress: Progress,
    pub dataset_id: DatasetId,
}

impl Task {
    /// Hand this task to a labeler with the given class exposure.
    pub fn assign(
        self,
        class: ClassSelection,
        labeler_id: LabelerId,
        developer_id: DeveloperId,
    ) -> AssignedTask {
        AssignedTask {
            task_id: self.task_id,
            kind: self.kind,
            data: self.data,
            multiclass: self.multiclass,
            instructions: self.instructions,
            class,
            job_id: JobId::generate(),
            labeler_id,
            developer_id,
            labeling_method: LabelingMethod::MultipleChoice,
            stopped_by_timer: None,
            begin_timestamp: None,
            end_timestamp: None,
            skipped: false,
        }
    }
}

/// A task instance handed to one labeler.
///
/// The allocator returns these with every class unanswered and no timestamps.
/// The client sends the same shape back with the answers, timer fields and
/// `skipped` filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTask {
    pub task_id: TaskId,
    #[serde(rename = "type")]
    pub kind: TaskType,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub multiclass: bool,
    #[serde(default)]
    pub instructions: String,
    pub class: ClassSelection,
    pub job_id: JobId,
    pub labeler_id: LabelerId,
    pub developer_id: DeveloperId,
    #[serde(default)]
    pub labeling_method: LabelingMethod,
    #[serde(default)]
    pub stopped_by_timer: Option<bool>,
    #[serde(default)]
    pub begin_timestamp: Option<TimestampMs>,
    #[serde(default)]
    pub end_timestamp: Option<TimestampMs>,
    #[serde(default)]
    pub skipped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored() -> Task {
        serde_json::from_value(json!({
            "taskId": "1413413089602753",
            "type": "text",
            "data": "I am Daniel.",
            "multiclass": false,
            "instructions": "Choose the appropriate sentiment for this text.",
            "class": {"Negative": 0, "Neutral": 2, "Positive": 5},
            "progress": {"current": 1, "total": 3},
            "datasetId": "4898691044887699"
        }))
        .unwrap()
    }

    #[test]
    fn assign_carries_task_fields_and_resets_job_fields() {
        let mut class = ClassSelection::new();
        class.offer("Negative");
        class.offer("Neutral");

        let assigned = stored().assign(class.clone(), "l-1".into(), "d-1".into());
        assert_eq!(assigned.task_id.as_str(), "1413413089602753");
        assert_eq!(assigned.class, class);
        assert_eq!(assigned.labeling_method, LabelingMethod::MultipleChoice);
        assert!(!assigned.skipped);
        assert!(assigned.begin_timestamp.is_none());
        assert!(!assigned.job_id.as_str().is_empty());
    }

    #[test]
    fn assigned_task_emits_null_timer_fields() {
        let assigned = stored().assign(ClassSelection::new(), "l".into(), "d".into());
        let value = serde_json::to_value(&assigned).unwrap();

        assert_eq!(value["labelingMethod"], json!("multipleChoice"));
        assert_eq!(value["stoppedByTimer"], Value::Null);
        assert_eq!(value["beginTimestamp"], Value::Null);
        assert_eq!(value["endTimestamp"], Value::Null);
        assert_eq!(value["type"], json!("text"));
        assert!(value.get("progress").is_none());
    }

    #[test]
    fn answer_without_optional_fields_parses() {
        let answer: AssignedTask = serde_json::from_value(json!({
            "taskId": "t",
            "type": "text",
            "class": {"A": true, "B": false},
            "jobId": "j",
            "labelerId": "l",
            "developerId": "d"
        }))
        .unwrap();

        assert!(!answer.skipped);
        assert_eq!(answer.class.chosen().collect::<Vec<_>>(), ["A"]);
    }
}
