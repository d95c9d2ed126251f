//! Prometheus metrics backend for the quorum labeling service.
//!
//! This crate provides a [`PrometheusMetrics`] implementation of
//! [`quorum_core::MetricsBackend`] that exposes metrics in Prometheus format.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use quorum_core::{CoreConfig, LabelingService};
//! use quorum_prometheus::PrometheusMetrics;
//! use quorum_store::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let service = LabelingService::with_metrics(
//!     Arc::new(MemoryStore::new()),
//!     CoreConfig::default(),
//!     Arc::new(metrics.clone()),
//! )?;
//!
//! let text = metrics.encode_text()?;
//! # let _ = (service, text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `quorum_tasks_allocated_total` - Counter
//! - `quorum_allocation_pages` - Histogram
//! - `quorum_answers_submitted_total{outcome}` - Counter
//! - `quorum_tasks_finished_total` - Counter
//! - `quorum_datasets_finished_total` - Counter
//! - `quorum_storage_errors_total{op, table}` - Counter
//!
//! ## HTTP Server
//! This crate does NOT provide an HTTP server. `quorumd` serves
//! [`PrometheusMetrics::encode_text`] on `GET /metrics`.

mod backend;
pub use backend::{MetricsError, PrometheusMetrics};

pub use prometheus::{Encoder, Registry, TextEncoder};
