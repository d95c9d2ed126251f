use quorum_core::CoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::Core(e) => e.kind(),
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            ApiError::InvalidRequest(_) => None,
            ApiError::Core(e) => e.note(),
        }
    }

    /// HTTP status used when strict status codes are enabled.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::Core(e) => core_status(e),
        }
    }

    pub fn body(&self) -> ErrorBody {
        let failures = match self {
            ApiError::Core(CoreError::PartialAggregation { failures, .. }) => failures
                .iter()
                .map(|f| FailureDetail {
                    task_id: f.task_id.to_string(),
                    job_id: f.job_id.to_string(),
                    errors: f.errors.iter().map(ToString::to_string).collect(),
                })
                .collect(),
            _ => Vec::new(),
        };

        ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message: self.to_string(),
                note: self.note().map(str::to_string),
                failures,
            },
        }
    }
}

/// A batch failure takes the shared status of its task errors, or the
/// coarsest class when they differ.
fn core_status(err: &CoreError) -> u16 {
    match err {
        CoreError::InvalidAnswer(_) => 400,
        CoreError::NotFound { .. } => 404,
        CoreError::Conflict { .. } => 409,
        CoreError::PartialAggregation { failures, .. } => {
            let mut statuses = failures.iter().flat_map(|f| f.errors.iter()).map(core_status);
            let Some(first) = statuses.next() else {
                return 500;
            };
            statuses.fold(first, |acc, s| match (acc, s) {
                (a, b) if a == b => a,
                (a, b) if a >= 500 || b >= 500 => 500,
                _ => 400,
            })
        }
        CoreError::Storage { .. } | CoreError::InvalidConfig(_) | CoreError::Internal(_) => 500,
    }
}

/// Serialized error: `{"error":{"kind","message","note"?}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    pub task_id: String,
    pub job_id: String,
    pub errors: Vec<String>,
}
