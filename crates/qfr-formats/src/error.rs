//! Error types for the auxiliary format parsers.

use thiserror::Error;

/// Errors raised by the format parsers and the dispatch layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// A malformed `.real` file.
    #[error("[real parser] line {line}: {message}")]
    Real {
        /// 1-based source line.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A malformed `.tfc` file.
    #[error("[tfc parser] line {line}: {message}")]
    Tfc {
        /// 1-based source line.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A malformed GRCS file.
    #[error("[grcs parser] {0}")]
    Grcs(String),

    /// The file extension maps to no known format.
    #[error("extension '{0}' not recognized")]
    UnknownExtension(String),

    /// The format is known but not supported for this direction.
    #[error("{0}")]
    Unsupported(String),

    /// An error raised by the circuit container.
    #[error(transparent)]
    Ir(#[from] qfr_ir::IrError),

    /// An error raised by the OpenQASM front-end.
    #[error(transparent)]
    Qasm(#[from] qfr_qasm::ParseError),

    /// Input unreadable.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for format operations.
pub type FormatResult<T> = Result<T, FormatError>;
