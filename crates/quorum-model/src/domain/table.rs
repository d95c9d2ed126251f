use std::{borrow::Cow, fmt, str::FromStr};

use thiserror::Error;

use crate::DatasetId;

const DATASET_TASKS_PREFIX: &str = "dataset_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("unknown table: {0}")]
    Unknown(String),
}

/// Tables of the labeling store.
///
/// Each table names the attributes that form its primary key; every item put
/// into a table must carry them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Table {
    /// Tasks still collecting labels.
    UnfinishedTask,
    /// Tasks whose every class reached its occurrence target.
    FinishedTask,
    /// Which labeler has been given which task.
    LabelerTask,
    /// One record per labeler attempt.
    Job,
    /// Dataset-level progress.
    Dataset,
    /// Per-dataset sub-table tracking the finished flag of each member task.
    DatasetTasks(DatasetId),
    /// Allocation policy per developer.
    DeveloperProfile,
}

impl Table {
    /// Storage name of the table.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Table::UnfinishedTask => Cow::Borrowed("unfinished_task"),
            Table::FinishedTask => Cow::Borrowed("finished_task"),
            Table::LabelerTask => Cow::Borrowed("labeler_task"),
            Table::Job => Cow::Borrowed("job"),
            Table::Dataset => Cow::Borrowed("dataset"),
            Table::DatasetTasks(id) => Cow::Owned(format!("{DATASET_TASKS_PREFIX}{id}")),
            Table::DeveloperProfile => Cow::Borrowed("developer_profile"),
        }
    }

    /// Attribute names forming the primary key, in key order.
    pub fn key_attributes(&self) -> &'static [&'static str] {
        match self {
            Table::UnfinishedTask | Table::FinishedTask | Table::DatasetTasks(_) => &["taskId"],
            Table::LabelerTask => &["labelerId", "taskId"],
            Table::Job => &["jobId"],
            Table::Dataset => &["datasetId"],
            Table::DeveloperProfile => &["developerId"],
        }
    }
}

impl FromStr for Table {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfinished_task" => Ok(Table::UnfinishedTask),
            "finished_task" => Ok(Table::FinishedTask),
            "labeler_task" => Ok(Table::LabelerTask),
            "job" => Ok(Table::Job),
            "dataset" => Ok(Table::Dataset),
            "developer_profile" => Ok(Table::DeveloperProfile),
            other => match other.strip_prefix(DATASET_TASKS_PREFIX) {
                Some(id) if !id.is_empty() => Ok(Table::DatasetTasks(DatasetId::from(id))),
                _ => Err(TableError::Unknown(other.to_string())),
            },
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
