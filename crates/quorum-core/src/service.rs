use std::sync::Arc;

use quorum_model::{AssignedTask, DeveloperId, LabelerId, TaskId};
use quorum_store::Store;
use tracing::{info, instrument};

use crate::{
    Aggregator, Allocator, CoreConfig, CoreError, MetricsHandle, SubmitReport, TaskOutcome,
    access::StoreAccess, metrics::noop_metrics,
};

/// Entry point of the labeling core: allocation and aggregation over one
/// shared store.
#[derive(Clone)]
pub struct LabelingService {
    allocator: Allocator,
    aggregator: Aggregator,
}

impl LabelingService {
    /// Build a service with metrics disabled.
    pub fn new(store: Arc<dyn Store>, config: CoreConfig) -> Result<Self, CoreError> {
        Self::with_metrics(store, config, noop_metrics())
    }

    pub fn with_metrics(
        store: Arc<dyn Store>,
        config: CoreConfig,
        metrics: MetricsHandle,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        info!(
            max_occurrences = config.max_occurrences,
            conflict_retries = config.conflict_retries,
            record_assignment_on_allocate = config.record_assignment_on_allocate,
            "labeling service configured"
        );

        let access = StoreAccess::new(store, metrics);
        Ok(Self {
            allocator: Allocator::new(access.clone(), config.clone()),
            aggregator: Aggregator::new(access, config),
        })
    }

    #[instrument(level = "info", skip(self), fields(labeler_id = %labeler_id, developer_id = %developer_id))]
    pub async fn allocate(
        &self,
        labeler_id: &LabelerId,
        developer_id: &DeveloperId,
    ) -> Result<Vec<AssignedTask>, CoreError> {
        self.allocator.allocate(labeler_id, developer_id).await
    }

    #[instrument(level = "info", skip(self, answers), fields(count = answers.len()))]
    pub async fn submit(&self, answers: Vec<AssignedTask>) -> Result<SubmitReport, CoreError> {
        self.aggregator.submit(answers).await
    }

    /// Re-run the migration of a task left half-moved by an earlier failure.
    pub async fn reconcile(&self, task_id: &TaskId) -> Result<TaskOutcome, CoreError> {
        self.aggregator.reconcile(task_id).await
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }
}
