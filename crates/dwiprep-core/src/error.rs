use thiserror::Error;

/// Top-level error type for the dwiprep-core library.
#[derive(Debug, Error)]
pub enum DwiprepError {
    /// Invalid build parameter or configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// Graph wiring violation (duplicate node, unknown slot, double binding, cycle).
    #[error("graph error: {0}")]
    Graph(String),

    /// QC bundle or confound lengths do not line up on the volume axis.
    #[error("shape error: {0}")]
    Shape(String),

    /// Malformed QC archive or confound table.
    #[error("archive error: {0}")]
    Archive(String),

    /// Drawing backend failure.
    #[error("render error: {0}")]
    Render(String),

    /// Wraps `std::io::Error`.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, DwiprepError>;
