//! Error types for the OpenQASM front-end.

use thiserror::Error;

/// Errors that can occur while parsing or emitting OpenQASM.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Unrecognised character or unterminated string.
    #[error("lexical error at {line}:{col}: {message}")]
    Lex {
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        col: u32,
        /// What went wrong.
        message: String,
    },

    /// Unexpected token.
    #[error("syntax error at {line}:{col}: expected {expected}, found {found}")]
    Syntax {
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        col: u32,
        /// The expected token kind.
        expected: String,
        /// The token that was actually seen.
        found: String,
    },

    /// The input ended mid-construct.
    #[error("unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    /// An invoked gate (and any implicit-control base of it) is unknown.
    #[error("unknown gate '{0}'")]
    UnknownGate(String),

    /// A gate declaration references an undefined gate.
    #[error("undefined gate '{0}'")]
    UndefinedGate(String),

    /// A controlled invocation that cannot be synthesised.
    #[error("unsupported controlled form for '{gate}': {reason}")]
    UnsupportedControlledForm {
        /// The invoked gate name.
        gate: String,
        /// Why the synthesis failed.
        reason: String,
    },

    /// More arguments than the gate accepts.
    #[error("too many arguments for gate '{gate}': expected {expected}, got {got}")]
    TooManyArguments {
        /// The invoked gate name.
        gate: String,
        /// Accepted argument count.
        expected: usize,
        /// Provided argument count.
        got: usize,
    },

    /// Fewer arguments than the gate requires.
    #[error("too few arguments for gate '{gate}': expected {expected}, got {got}")]
    TooFewArguments {
        /// The invoked gate name.
        gate: String,
        /// Required argument count.
        expected: usize,
        /// Provided argument count.
        got: usize,
    },

    /// Parameter list length does not match the declaration.
    #[error("gate '{gate}' expects {expected} parameters, got {got}")]
    WrongParameterCount {
        /// The invoked gate name.
        gate: String,
        /// Declared parameter count.
        expected: usize,
        /// Provided parameter count.
        got: usize,
    },

    /// Two broadcast arguments of different non-unit sizes.
    #[error("register sizes do not match for gate '{0}'")]
    RegisterSizeMismatch(String),

    /// A qubit appears both as control and as target.
    #[error("qubit {0} cannot be control and target at the same time")]
    ControlTargetOverlap(u32),

    /// A qubit appears as a control more than once.
    #[error("qubit {0} cannot be a control more than once")]
    DuplicateControl(u32),

    /// The named register does not exist in the expected address space.
    #[error("'{name}' is not a declared {kind} register")]
    UnknownRegister {
        /// The looked-up name.
        name: String,
        /// Which address space was expected ("quantum" or "classical").
        kind: &'static str,
    },

    /// An index beyond the register size.
    #[error("index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        /// Register name.
        register: String,
        /// The offending index.
        index: u32,
        /// Declared register size.
        size: u32,
    },

    /// A malformed parameter expression.
    #[error("invalid expression at {line}:{col}: {message}")]
    InvalidExpression {
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        col: u32,
        /// What went wrong.
        message: String,
    },

    /// A construct the front-end does not support.
    #[error("{0}")]
    Unsupported(String),

    /// An error raised by the circuit container.
    #[error(transparent)]
    Ir(#[from] qfr_ir::IrError),

    /// Include file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for parsing and emission.
pub type ParseResult<T> = Result<T, ParseError>;
