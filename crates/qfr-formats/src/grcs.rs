//! Google random-circuit-sampling (GRCS) parser.
//!
//! The first token is the qubit count; every following record reads
//! `cycle gate args…` with the gate set `cz`, `h`, `t`, `x_1_2` (RX(π/2))
//! and `y_1_2` (RY(π/2)).

use std::f64::consts::FRAC_PI_2;

use qfr_ir::{Control, OpType, QuantumComputation, QubitId, StandardOperation};

use crate::error::{FormatError, FormatResult};

/// Parse GRCS source into a computation.
pub fn parse(source: &str) -> FormatResult<QuantumComputation> {
    parse_named(source, "grcs")
}

/// Parse GRCS source, naming the circuit.
pub fn parse_named(source: &str, name: &str) -> FormatResult<QuantumComputation> {
    let mut qc = QuantumComputation::new(name);
    let mut lines = source.lines();

    let nqubits: u32 = lines
        .next()
        .and_then(|l| l.trim().parse().ok())
        .ok_or_else(|| FormatError::Grcs("missing qubit count".into()))?;
    qc.add_qubit_register(nqubits, "q")?;
    let total = qc.total_qubits();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let _cycle: u32 = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| FormatError::Grcs(format!("invalid record '{line}'")))?;
        let gate = fields
            .next()
            .ok_or_else(|| FormatError::Grcs(format!("invalid record '{line}'")))?;

        let mut qubit = || -> FormatResult<QubitId> {
            fields
                .next()
                .and_then(|f| f.parse().ok())
                .map(QubitId)
                .ok_or_else(|| FormatError::Grcs(format!("invalid qubit in '{line}'")))
        };

        match gate {
            "cz" => {
                let control = qubit()?;
                let target = qubit()?;
                qc.push(StandardOperation::controlled(
                    total,
                    OpType::Z,
                    vec![Control::pos(control)],
                    target,
                ));
            }
            "h" => {
                let target = qubit()?;
                qc.push(StandardOperation::new(total, OpType::H, target));
            }
            "t" => {
                let target = qubit()?;
                qc.push(StandardOperation::new(total, OpType::T, target));
            }
            "x_1_2" => {
                let target = qubit()?;
                qc.push(
                    StandardOperation::new(total, OpType::Rx, target).with_params(&[FRAC_PI_2]),
                );
            }
            "y_1_2" => {
                let target = qubit()?;
                qc.push(
                    StandardOperation::new(total, OpType::Ry, target).with_params(&[FRAC_PI_2]),
                );
            }
            other => {
                return Err(FormatError::Grcs(format!("unknown gate '{other}'")));
            }
        }
    }

    Ok(qc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfr_ir::Operation;

    #[test]
    fn test_gate_set() {
        let source = "\
3
0 h 0
0 h 1
1 cz 0 1
2 t 2
3 x_1_2 0
3 y_1_2 1
";
        let qc = parse(source).unwrap();
        assert_eq!(qc.num_qubits(), 3);
        assert_eq!(qc.num_ops(), 6);

        match &qc.ops()[2] {
            Operation::Standard(op) => {
                assert_eq!(op.op, OpType::Z);
                assert_eq!(op.controls[0].qubit, QubitId(0));
                assert_eq!(op.targets[0], QubitId(1));
            }
            other => panic!("expected CZ, got {other:?}"),
        }
        match &qc.ops()[4] {
            Operation::Standard(op) => {
                assert_eq!(op.op, OpType::Rx);
                assert!((op.params[0] - FRAC_PI_2).abs() < 1e-15);
            }
            other => panic!("expected RX, got {other:?}"),
        }
    }

    #[test]
    fn test_identity_layouts() {
        let qc = parse("2\n0 h 0\n").unwrap();
        assert_eq!(qc.initial_layout().len(), 2);
        assert_eq!(qc.output_permutation().len(), 2);
        assert_eq!(qc.initial_layout().get(&QubitId(1)), Some(&QubitId(1)));
    }

    #[test]
    fn test_unknown_gate_rejected() {
        let err = parse("1\n0 zz 0\n").unwrap_err();
        assert!(matches!(err, FormatError::Grcs(_)));
    }
}
