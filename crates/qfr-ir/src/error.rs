//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building or mutating a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A register with this name already exists and cannot be reused.
    #[error("register '{0}' already exists")]
    RegisterAlreadyExists(String),

    /// Only the register ending at the current tail of the address space
    /// may be extended.
    #[error("register '{0}' cannot be extended: it does not end at the current tail")]
    RegisterExtensionIllegal(String),

    /// No register covers the given index.
    #[error("no {kind} register covers index {index}")]
    UnknownRegister {
        /// Which address space was searched ("quantum" or "classical").
        kind: &'static str,
        /// The index that was looked up.
        index: u32,
    },

    /// The qubit count would exceed the fixed capacity.
    #[error("{requested} qubits exceed the capacity of {max}")]
    CapacityExceeded {
        /// Total qubit count after the rejected mutation.
        requested: u32,
        /// The compile-time bound.
        max: u32,
    },

    /// The physical index is already part of the layout.
    #[error("physical qubit {0} is already assigned")]
    QubitAlreadyAssigned(u32),

    /// The logical index does not appear in the initial layout.
    #[error("logical qubit {0} is not present in the initial layout")]
    UnknownLogicalQubit(u32),

    /// A logical index beyond the current qubit count was requested.
    #[error("logical qubit index {index} exceeds the current qubit count {count}")]
    LogicalIndexOutOfRange {
        /// The requested logical index.
        index: u32,
        /// The current number of data qubits.
        count: u32,
    },

    /// A measurement pairs differently sized qubit and classical runs.
    #[error("measurement pairs {qubits} qubits with {classics} classical bits")]
    MeasurementMismatch {
        /// Number of measured qubits.
        qubits: usize,
        /// Number of classical destinations.
        classics: usize,
    },

    /// A malformed parameter expression.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// Evaluation reached a symbol with no binding.
    #[error("unresolved identifier '{0}' in expression")]
    UnresolvedIdentifier(String),

    /// A decision-diagram path was asked to process a non-unitary operation.
    #[error("operation '{0}' is not unitary")]
    NonUnitary(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
