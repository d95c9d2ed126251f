use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};
use quorum_core::{MetricsBackend, StorageOp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Register(#[from] prometheus::Error),
    #[error("metrics output is not valid UTF-8")]
    Encoding,
}

/// Prometheus-backed [`MetricsBackend`].
///
/// Clones share the same registry and collectors.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    tasks_allocated: IntCounter,
    allocation_pages: Histogram,
    answers_submitted: IntCounterVec,
    tasks_finished: IntCounter,
    datasets_finished: IntCounter,
    storage_errors: IntCounterVec,
}

impl PrometheusMetrics {
    /// Create collectors in a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Create collectors in `registry`.
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let tasks_allocated = IntCounter::with_opts(Opts::new(
            "quorum_tasks_allocated_total",
            "Tasks handed out to labelers",
        ))?;
        let allocation_pages = Histogram::with_opts(
            HistogramOpts::new(
                "quorum_allocation_pages",
                "Unfinished-task scan pages read per allocation",
            )
            .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]),
        )?;
        let answers_submitted = IntCounterVec::new(
            Opts::new("quorum_answers_submitted_total", "Answered tasks by outcome"),
            &["outcome"],
        )?;
        let tasks_finished = IntCounter::with_opts(Opts::new(
            "quorum_tasks_finished_total",
            "Tasks moved to the finished table",
        ))?;
        let datasets_finished = IntCounter::with_opts(Opts::new(
            "quorum_datasets_finished_total",
            "Datasets whose every task finished",
        ))?;
        let storage_errors = IntCounterVec::new(
            Opts::new("quorum_storage_errors_total", "Failed storage operations"),
            &["op", "table"],
        )?;

        registry.register(Box::new(tasks_allocated.clone()))?;
        registry.register(Box::new(allocation_pages.clone()))?;
        registry.register(Box::new(answers_submitted.clone()))?;
        registry.register(Box::new(tasks_finished.clone()))?;
        registry.register(Box::new(datasets_finished.clone()))?;
        registry.register(Box::new(storage_errors.clone()))?;

        Ok(Self {
            registry,
            tasks_allocated,
            allocation_pages,
            answers_submitted,
            tasks_finished,
            datasets_finished,
            storage_errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|_| MetricsError::Encoding)
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_tasks_allocated(&self, count: usize) {
        self.tasks_allocated.inc_by(count as u64);
    }

    fn record_allocation_pages(&self, pages: usize) {
        self.allocation_pages.observe(pages as f64);
    }

    fn record_answer(&self, outcome: &str) {
        self.answers_submitted.with_label_values(&[outcome]).inc();
    }

    fn record_task_finished(&self) {
        self.tasks_finished.inc();
    }

    fn record_dataset_finished(&self) {
        self.datasets_finished.inc();
    }

    fn record_storage_error(&self, op: StorageOp, table: &str) {
        self.storage_errors
            .with_label_values(&[op.as_str(), table])
            .inc();
    }
}
