use std::fmt;

use quorum_model::{JobId, Table, TaskId};
use quorum_store::StoreError;
use thiserror::Error;

/// Storage call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOp {
    Get,
    Put,
    Delete,
    Update,
    Scan,
}

impl StorageOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOp::Get => "get",
            StorageOp::Put => "put",
            StorageOp::Delete => "delete",
            StorageOp::Update => "update",
            StorageOp::Scan => "scan",
        }
    }
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{note} ({source})")]
    Storage {
        op: StorageOp,
        table: String,
        /// Human-readable sentence naming the failed call.
        note: String,
        #[source]
        source: StoreError,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("task {task_id} was modified concurrently {attempts} times in a row")]
    Conflict { task_id: TaskId, attempts: u32 },

    #[error("invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("aggregation failed for {} task(s), {succeeded} succeeded", .failures.len())]
    PartialAggregation {
        succeeded: usize,
        failures: Vec<TaskFailure>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn storage(op: StorageOp, table: &Table, source: StoreError) -> Self {
        CoreError::Storage {
            op,
            table: table.name().into_owned(),
            note: format!("The {op} operation for the '{table}' table failed."),
            source,
        }
    }

    /// Stable machine-readable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Storage { .. } => "StorageOperationFailure",
            CoreError::NotFound { .. } => "NotFound",
            CoreError::Conflict { .. } => "Conflict",
            CoreError::InvalidAnswer(_) => "InvalidAnswer",
            CoreError::InvalidConfig(_) => "InvalidConfig",
            CoreError::PartialAggregation { .. } => "PartialAggregation",
            CoreError::Internal(_) => "Internal",
        }
    }

    /// Operator-facing note, when the error carries one.
    pub fn note(&self) -> Option<&str> {
        match self {
            CoreError::Storage { note, .. } => Some(note),
            _ => None,
        }
    }
}

/// One answered task whose aggregation failed.
#[derive(Debug)]
pub struct TaskFailure {
    pub task_id: TaskId,
    pub job_id: JobId,
    /// Every effect that failed for this task; recording and counting fail
    /// independently.
    pub errors: Vec<CoreError>,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {} (job {}):", self.task_id, self.job_id)?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { " " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}
