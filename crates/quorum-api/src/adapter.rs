use std::sync::Arc;

use async_trait::async_trait;
use quorum_core::{LabelingService, SubmitReport};
use quorum_model::{AssignedTask, DeveloperId, LabelerId};

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// [`ApiHandler`] backed by a shared `LabelingService`.
pub struct ServiceAdapter {
    service: Arc<LabelingService>,
}

impl ServiceAdapter {
    pub fn new(service: Arc<LabelingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ApiHandler for ServiceAdapter {
    async fn allocate(
        &self,
        labeler_id: &LabelerId,
        developer_id: &DeveloperId,
    ) -> Result<Vec<AssignedTask>, ApiError> {
        self.service
            .allocate(labeler_id, developer_id)
            .await
            .map_err(ApiError::from)
    }

    async fn submit(&self, answers: Vec<AssignedTask>) -> Result<SubmitReport, ApiError> {
        self.service.submit(answers).await.map_err(ApiError::from)
    }
}
