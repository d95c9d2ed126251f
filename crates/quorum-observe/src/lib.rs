//! Logger initialisation for quorum services.
//!
//! ```no_run
//! use quorum_observe::{LoggerConfig, LoggerFormat, logger_init};
//!
//! let cfg = LoggerConfig::default()
//!     .with_format(LoggerFormat::Json)
//!     .with_level("info,quorum_core=debug");
//! logger_init(&cfg).expect("logger");
//! ```

mod logger;
pub use logger::*;
