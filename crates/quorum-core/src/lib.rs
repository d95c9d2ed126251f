//! Labeling core: class rationing, task allocation and progress aggregation.
//!
//! [`LabelingService`] ties the pieces together over a shared
//! [`quorum_store::Store`]:
//!
//! - [`ration`] picks the classes shown to a labeler for one task;
//! - [`Allocator`] hands out batches of tasks a labeler has not seen;
//! - [`Aggregator`] applies answered tasks, migrating complete tasks and
//!   cascading completion to their dataset.

mod access;

pub mod error;
pub use error::{CoreError, StorageOp, TaskFailure};

pub mod config;
pub use config::CoreConfig;

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoopMetrics};

mod ration;
pub use ration::ration;

mod allocate;
pub use allocate::Allocator;

mod aggregate;
pub use aggregate::{Aggregator, SubmitReport, TaskOutcome, TaskReport};

mod service;
pub use service::LabelingService;
