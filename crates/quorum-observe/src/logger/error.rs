use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    /// Format name is none of `text`, `json` or `journald`.
    #[error("unknown log format '{0}', expected text, json or journald")]
    InvalidFormat(String),

    #[error("journald output needs linux and the `journald` feature")]
    JournaldNotSupported,

    #[error("a global logger is already installed")]
    AlreadyInitialized,

    #[error("logger setup failed: {0}")]
    InitializationFailed(String),

    /// The level string is not a valid `EnvFilter` directive list.
    #[error("invalid log level directives: {0}")]
    InvalidLogLevel(String),
}
