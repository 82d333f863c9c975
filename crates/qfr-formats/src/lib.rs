//! Auxiliary circuit-format parsers and extension-based dispatch.
//!
//! Three textual reversible-circuit formats share the QFR IR and its
//! register algebra:
//!
//! | Extension | Format | Parser |
//! |-----------|--------|--------|
//! | `.real` | RevLib | [`real`] |
//! | `.qasm` | OpenQASM 2.0 | `qfr-qasm` |
//! | `.txt`  | Google GRCS | [`grcs`] |
//! | `.tfc`  | Toffoli | [`tfc`] |
//!
//! [`import`] dispatches on the extension and names the circuit after the
//! file stem; [`export`] writes the canonical OpenQASM form for `.qasm`
//! targets.
//!
//! # Example
//!
//! ```rust
//! use qfr_formats::{import_source, Format};
//!
//! let qc = import_source(
//!     ".numvars 3\n.variables a b c\n.begin\nt3 a b c\n.end\n",
//!     Format::Real,
//!     "toffoli",
//! )
//! .unwrap();
//! assert_eq!(qc.num_qubits(), 3);
//! assert_eq!(qc.num_ops(), 1);
//! ```

pub mod error;
pub mod grcs;
pub mod real;
pub mod tfc;

use std::fs;
use std::path::Path;

use qfr_ir::QuantumComputation;

pub use error::{FormatError, FormatResult};
pub use real::REAL_DIVISOR_TOLERANCE;

/// A supported circuit description format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// RevLib `.real`.
    Real,
    /// OpenQASM 2.0.
    OpenQasm,
    /// Google random circuit sampling `.txt`.
    Grcs,
    /// Toffoli `.tfc`.
    Tfc,
}

impl Format {
    /// Map a file extension (lowercased) to its format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "real" => Some(Format::Real),
            "qasm" => Some(Format::OpenQasm),
            "txt" => Some(Format::Grcs),
            "tfc" => Some(Format::Tfc),
            _ => None,
        }
    }
}

/// Import a circuit file, dispatching on its extension. The circuit is
/// named after the file stem.
pub fn import(path: impl AsRef<Path>) -> FormatResult<QuantumComputation> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let format = Format::from_extension(&extension)
        .ok_or_else(|| FormatError::UnknownExtension(extension.clone()))?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("circuit")
        .to_string();
    let source = fs::read_to_string(path)?;

    match format {
        Format::OpenQasm => {
            let include_dir = path.parent().map(Path::to_path_buf);
            Ok(qfr_qasm::parse_named(&source, &name, include_dir)?)
        }
        _ => import_source(&source, format, &name),
    }
}

/// Import circuit source in a given format.
pub fn import_source(
    source: &str,
    format: Format,
    name: &str,
) -> FormatResult<QuantumComputation> {
    match format {
        Format::Real => real::parse_named(source, name),
        Format::OpenQasm => Ok(qfr_qasm::parse_named(source, name, None)?),
        Format::Grcs => grcs::parse_named(source, name),
        Format::Tfc => tfc::parse_named(source, name),
    }
}

/// Export a circuit, dispatching on the target extension. Only the
/// canonical OpenQASM form is supported for writing.
pub fn export(qc: &QuantumComputation, path: impl AsRef<Path>) -> FormatResult<()> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match Format::from_extension(&extension) {
        Some(Format::OpenQasm) => {
            let source = qfr_qasm::emit(qc)?;
            fs::write(path, source)?;
            Ok(())
        }
        Some(other) => Err(FormatError::Unsupported(format!(
            "dumping in {other:?} format is not supported"
        ))),
        None => Err(FormatError::UnknownExtension(extension)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_dispatch() {
        assert_eq!(Format::from_extension("real"), Some(Format::Real));
        assert_eq!(Format::from_extension("qasm"), Some(Format::OpenQasm));
        assert_eq!(Format::from_extension("txt"), Some(Format::Grcs));
        assert_eq!(Format::from_extension("tfc"), Some(Format::Tfc));
        assert_eq!(Format::from_extension("py"), None);
    }

    #[test]
    fn test_import_names_circuit_after_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adder.real");
        std::fs::write(&path, ".numvars 2\n.variables a b\n.begin\nt2 a b\n.end\n").unwrap();

        let qc = import(&path).unwrap();
        assert_eq!(qc.name(), "adder");
        assert_eq!(qc.num_qubits(), 2);
    }

    #[test]
    fn test_import_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit.xyz");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            import(&path),
            Err(FormatError::UnknownExtension(_))
        ));
    }

    #[test]
    fn test_export_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let qasm_in = dir.path().join("bell.qasm");
        std::fs::write(
            &qasm_in,
            "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;",
        )
        .unwrap();

        let qc = import(&qasm_in).unwrap();
        assert_eq!(qc.name(), "bell");

        let qasm_out = dir.path().join("bell_out.qasm");
        export(&qc, &qasm_out).unwrap();
        let reparsed = import(&qasm_out).unwrap();
        assert_eq!(reparsed.num_qubits(), 2);
        assert_eq!(reparsed.num_ops(), 3);
    }

    #[test]
    fn test_export_real_unsupported() {
        let qc = QuantumComputation::new("empty");
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            export(&qc, dir.path().join("out.real")),
            Err(FormatError::Unsupported(_))
        ));
    }

    #[test]
    fn test_real_import_via_source() {
        let qc = import_source(
            ".numvars 3\n.variables a b c\n.begin\nt3 a b c\n.end\n",
            Format::Real,
            "mct",
        )
        .unwrap();
        assert_eq!(qc.name(), "mct");
        assert_eq!(qc.num_ops(), 1);
    }
}
