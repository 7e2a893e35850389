//! Error types for pipeline runs

use thiserror::Error;

use wipeline_domain::ParseError;

/// Errors that can occur while running the pipeline
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Report source failure (network, auth, API rejection)
    #[error("Source error: {0}")]
    Source(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Response document could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Control file could not be read, decoded or written
    #[error("Control file error: {0}")]
    Control(String),

    /// Filesystem error writing export output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
