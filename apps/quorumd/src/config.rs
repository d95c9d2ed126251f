use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use envconfig::Envconfig;
use quorum_api::DispatchConfig;
use quorum_core::CoreConfig;
use quorum_observe::{LoggerConfig, LoggerFormat};

/// Storage backend behind the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redb,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redb" => Ok(StoreBackend::Redb),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct AppConfig {
    #[envconfig(from = "BIND_ADDR", default = "0.0.0.0:8080")]
    pub bind_addr: String,
    #[envconfig(from = "STORE_BACKEND", default = "memory")]
    pub store_backend: StoreBackend,
    #[envconfig(from = "STORE_PATH", default = "quorum.redb")]
    pub store_path: PathBuf,
    #[envconfig(from = "SEED_DIR")]
    pub seed_dir: Option<PathBuf>,
    #[envconfig(from = "MAX_OCCURRENCES", default = "5")]
    pub max_occurrences: u32,
    #[envconfig(from = "CONFLICT_RETRIES", default = "3")]
    pub conflict_retries: u32,
    #[envconfig(from = "RECORD_ASSIGNMENT_ON_ALLOCATE", default = "false")]
    pub record_assignment_on_allocate: bool,
    #[envconfig(from = "STRICT_STATUS", default = "false")]
    pub strict_status: bool,
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,
    #[envconfig(from = "LOG_FORMAT", default = "text")]
    pub log_format: LoggerFormat,
}

impl AppConfig {
    pub fn core(&self) -> CoreConfig {
        CoreConfig {
            max_occurrences: self.max_occurrences,
            conflict_retries: self.conflict_retries,
            record_assignment_on_allocate: self.record_assignment_on_allocate,
        }
    }

    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            strict_status: self.strict_status,
        }
    }

    pub fn logger(&self) -> LoggerConfig {
        LoggerConfig::default()
            .with_format(self.log_format)
            .with_level(self.log_level.clone())
    }
}

impl Display for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "BIND_ADDR: {}", self.bind_addr)?;
        writeln!(f, "STORE_BACKEND: {:?}", self.store_backend)?;
        writeln!(f, "STORE_PATH: {}", self.store_path.display())?;
        match &self.seed_dir {
            Some(dir) => writeln!(f, "SEED_DIR: {}", dir.display())?,
            None => writeln!(f, "SEED_DIR: -")?,
        }
        writeln!(f, "MAX_OCCURRENCES: {}", self.max_occurrences)?;
        writeln!(f, "CONFLICT_RETRIES: {}", self.conflict_retries)?;
        writeln!(
            f,
            "RECORD_ASSIGNMENT_ON_ALLOCATE: {}",
            self.record_assignment_on_allocate
        )?;
        writeln!(f, "STRICT_STATUS: {}", self.strict_status)?;
        writeln!(f, "LOG_LEVEL: {}", self.log_level)?;
        write!(f, "LOG_FORMAT: {}", self.log_format)
    }
}
