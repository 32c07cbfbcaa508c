//! Error types for the extraction and restore pipelines.

use thiserror::Error;

/// Errors from running the extraction or restore pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Pre-flight failure: missing exporter binary, or a config path that
    /// does not exist or is not a regular file. No subprocess was started.
    #[error("configuration error: {0}")]
    Config(String),

    /// The exporter reported an error on its diagnostic channel. Carries
    /// the diagnostic text verbatim.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The replay client exited non-zero. Carries the client's diagnostic
    /// text.
    #[error("restore failed: {0}")]
    Writer(String),

    /// I/O failure in the pipeline itself or on the consumer side.
    #[error("pipeline i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
