use std::sync::Arc;

use crate::StorageOp;

/// Sink for service metrics.
///
/// Implementations must be cheap to call; they run inline on the request
/// path.
pub trait MetricsBackend: Send + Sync + 'static {
    fn record_tasks_allocated(&self, count: usize);
    fn record_allocation_pages(&self, pages: usize);
    /// One answer processed; `outcome` is a `TaskOutcome` label or `"failed"`.
    fn record_answer(&self, outcome: &str);
    fn record_task_finished(&self);
    fn record_dataset_finished(&self);
    fn record_storage_error(&self, op: StorageOp, table: &str);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

/// Metrics backend that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_tasks_allocated(&self, _count: usize) {}
    fn record_allocation_pages(&self, _pages: usize) {}
    fn record_answer(&self, _outcome: &str) {}
    fn record_task_finished(&self) {}
    fn record_dataset_finished(&self) {}
    fn record_storage_error(&self, _op: StorageOp, _table: &str) {}
}

pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoopMetrics)
}
