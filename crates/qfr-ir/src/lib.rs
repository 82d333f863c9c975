//! QFR Circuit Intermediate Representation
//!
//! This crate provides the core data structures for representing reversible
//! and quantum circuits: a typed operation sequence over a split address
//! space of data qubits, ancillary qubits and classical bits, together with
//! the register maps and layout permutations that define a circuit's I/O
//! interface.
//!
//! # Core Components
//!
//! - **Indices**: [`QubitId`], [`ClbitId`] for addressing the quantum and
//!   classical address spaces, [`Permutation`] for the physical-to-logical
//!   layout maps
//! - **Registers**: [`Register`] runs with fragmentation (`_l`/`_h`
//!   splitting) and consolidation
//! - **Operations**: [`Operation`] as a sum of standard (parameterised
//!   unitary), compound, non-unitary and classically controlled variants
//! - **Expressions**: [`Expr`] with on-the-fly constant folding, for
//!   parameterised gate macros
//! - **Container**: [`QuantumComputation`] owning one operation sequence
//!   plus the register, layout and bitset state
//! - **DD seam**: the [`dd::DdPackage`] trait, the narrow interface the
//!   core requires of an external decision-diagram engine
//!
//! # Example
//!
//! ```rust
//! use qfr_ir::{OpType, QuantumComputation, QubitId, StandardOperation};
//!
//! let mut qc = QuantumComputation::new("bell");
//! qc.add_qubit_register(2, "q").unwrap();
//! qc.add_classical_register(2, "c").unwrap();
//!
//! qc.push(StandardOperation::new(2, OpType::H, QubitId(0)));
//! assert_eq!(qc.num_ops(), 1);
//! assert_eq!(qc.total_qubits(), 2);
//! ```

pub mod bitset;
pub mod computation;
pub mod dd;
pub mod error;
pub mod expr;
pub mod operation;
pub mod qubit;
pub mod register;

pub use bitset::Bitset;
pub use computation::{QuantumComputation, Statistics};
pub use dd::{DdPackage, Line, LineStatus, ReorderStrategy, MAX_QUBITS};
pub use error::{IrError, IrResult};
pub use expr::{Expr, UnaryFn};
pub use operation::{
    ClassicControlledOperation, CompoundOperation, Control, NonUnitaryOperation, OpType, Operation,
    Polarity, StandardOperation,
};
pub use qubit::{ClbitId, Permutation, QubitId};
pub use register::{Register, RegisterMap, DEFAULT_ANCREG, DEFAULT_CREG, DEFAULT_QREG};
