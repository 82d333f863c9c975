//! `OpenQASM` 2.0 front-end and emitter for the QFR circuit IR.
//!
//! The parser lowers `OpenQASM` 2.0 source directly onto a
//! [`qfr_ir::QuantumComputation`]: register declarations populate the
//! register maps, gate declarations are flattened into a macro store over
//! the four primitives `U`, `CX`, `CU` and `MCX`, and invocations expand
//! through the implicit-control convention (`c…` name prefixes),
//! multi-control Toffoli synthesis, controlled-U rewriting, and
//! whole-register broadcasting. The standard `qelib1.inc` library is
//! embedded, so `include "qelib1.inc";` needs no file system.
//!
//! # Example: Parsing
//!
//! ```rust
//! use qfr_qasm::parse;
//!
//! let qasm = r#"
//!     OPENQASM 2.0;
//!     qreg q[2];
//!     creg c[2];
//!     h q[0];
//!     cx q[0],q[1];
//!     measure q -> c;
//! "#;
//!
//! let qc = parse(qasm).unwrap();
//! assert_eq!(qc.num_qubits(), 2);
//! assert_eq!(qc.num_ops(), 3);
//! ```
//!
//! # Example: Emitting
//!
//! ```rust
//! use qfr_qasm::{emit, parse};
//!
//! let qc = parse("OPENQASM 2.0;\nqreg q[1];\nU(0,0,pi/2) q[0];").unwrap();
//! let out = emit(&qc).unwrap();
//! assert!(out.contains("OPENQASM 2.0;"));
//! assert!(out.contains("u3(0,0,pi/2) q[0];"));
//! ```

mod emitter;
mod error;
mod lexer;
mod parser;
mod qelib1;
mod scanner;

pub use emitter::emit;
pub use error::{ParseError, ParseResult};
pub use parser::{parse, parse_named};
pub use qelib1::QELIB1;
