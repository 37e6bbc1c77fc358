//! Error types for benchmark and report operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Failed to parse configuration file '{path}': {source}")]
    ConfigParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration validation error for field '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid benchmark settings: {message}")]
    InvalidSettings { message: String },

    #[error("Unknown operator: '{name}'")]
    UnknownOperator { name: String },

    #[error("Unknown toolkit: '{name}'")]
    UnknownToolkit { name: String },

    #[error("Unknown {mode} configuration set '{set}' for toolkit '{toolkit}'")]
    UnknownConfigSet {
        toolkit: String,
        set: String,
        mode: String,
    },

    #[error("Unknown device '{device}'. Expected 'cpu' or 'cpu:<threads>'")]
    UnknownDevice { device: String },

    #[error("Failed to pin device '{device}': {message}")]
    DevicePinFailed { device: String, message: String },

    #[error("Record count mismatch: {configurations} configurations but {records} records")]
    RecordCountMismatch {
        configurations: usize,
        records: usize,
    },

    #[error("Failed to spawn report worker for {job}: {source}")]
    WorkerSpawnError {
        job: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

pub type BenchmarkResult<T> = Result<T, BenchmarkError>;
