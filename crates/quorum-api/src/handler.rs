use async_trait::async_trait;
use quorum_core::SubmitReport;
use quorum_model::{AssignedTask, DeveloperId, LabelerId};

use crate::error::ApiError;

/// Backend the request surface calls into.
///
/// [`ServiceAdapter`](crate::ServiceAdapter) forwards to a `LabelingService`.
/// Wrap it or write another implementation to put checks in front of it.
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Allocate a batch of tasks to a labeler on behalf of a developer.
    async fn allocate(
        &self,
        labeler_id: &LabelerId,
        developer_id: &DeveloperId,
    ) -> Result<Vec<AssignedTask>, ApiError>;

    /// Submit answered (or skipped) tasks.
    async fn submit(&self, answers: Vec<AssignedTask>) -> Result<SubmitReport, ApiError>;
}
