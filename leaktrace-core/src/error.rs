/// Top-level leaktrace error type.
///
/// All fallible operations in `leaktrace-core` return
/// [`Result<T, LeaktraceError>`](Result). Each variant wraps a
/// domain-specific error enum, allowing callers to match on the error
/// source without losing type information. Lookup misses (unknown node,
/// unmatched name or class) are deliberately *not* errors — they surface
/// as empty result sets per the query contract.
#[derive(thiserror::Error, Debug)]
pub enum LeaktraceError {
    /// Error from the snapshot engine (decode, schema, graph build).
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] leaktrace_snapshot::SnapshotError),

    /// Error in task lifecycle management.
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the raw-capture translation boundary.
    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),
}

/// Errors in analysis-task lifecycle management.
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    /// The given task id is not registered (already destroyed or never
    /// created).
    #[error("Unknown task id: {0}")]
    UnknownTask(i64),

    /// The background decode worker terminated abnormally.
    #[error("Background decode failed: {0}")]
    Background(String),
}

/// Errors in leaktrace configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors from the opaque raw-capture translator.
#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    /// No translator command is configured.
    #[error("No raw-capture translator configured")]
    NotConfigured,

    /// The translator process exited with a non-success status.
    #[error("Translator `{command}` exited with status {status}")]
    CommandFailed { command: String, status: i32 },

    /// The translator process could not be started.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, LeaktraceError>`.
pub type Result<T> = std::result::Result<T, LeaktraceError>;
