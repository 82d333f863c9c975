//! RevLib `.real` parser.
//!
//! Header commands begin with `.`; gate lines follow `.begin` and match
//! `(r[xyz]|q|[0a-z](?:[+i])?)(\d+)?(?::divisor)?`. The `t` family is a
//! multi-controlled X, `f` a SWAP, `p` a Peres gate. `RZ`/`U1`-like gates
//! with a near-integer divisor are canonicalised to Z/S/T phase gates.

use std::f64::consts::PI;

use once_cell::sync::Lazy;
use regex::Regex;

use qfr_ir::{Control, OpType, Operation, QuantumComputation, QubitId, StandardOperation};

use crate::error::{FormatError, FormatResult};

/// Numerical tolerance deciding whether a rotation divisor counts as an
/// integer for the Z/S/T canonicalisation. Not persisted in any file
/// format, so it is a configuration constant rather than a hard-coded
/// comparison.
pub const REAL_DIVISOR_TOLERANCE: f64 = 1e-9;

static GATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(r[xyz]|q|[0a-z](?:[+i])?)(\d+)?(?::([-+]?[0-9]+[.]?[0-9]*(?:[eE][-+]?[0-9]+)?))?$")
        .expect("gate regex is valid")
});

fn real_error(line: usize, message: impl Into<String>) -> FormatError {
    FormatError::Real {
        line,
        message: message.into(),
    }
}

fn real_gate(id: &str) -> Option<OpType> {
    Some(match id {
        "i" => OpType::I,
        "h" => OpType::H,
        "x" => OpType::X,
        "y" => OpType::Y,
        "z" => OpType::Z,
        "s" => OpType::S,
        "s+" | "si" => OpType::Sdag,
        "v" => OpType::V,
        "v+" | "vi" => OpType::Vdag,
        "p" => OpType::Peres,
        "p+" | "pi" => OpType::PeresDag,
        "f" => OpType::Swap,
        "q" => OpType::Rz,
        "rx" => OpType::Rx,
        "ry" => OpType::Ry,
        "rz" => OpType::Rz,
        _ => return None,
    })
}

/// Parse RevLib `.real` source into a computation.
pub fn parse(source: &str) -> FormatResult<QuantumComputation> {
    parse_named(source, "real")
}

/// Parse RevLib `.real` source, naming the circuit.
pub fn parse_named(source: &str, name: &str) -> FormatResult<QuantumComputation> {
    let mut qc = QuantumComputation::new(name);
    let mut lines = source.lines().enumerate();
    let mut declared = 0u32;
    let mut variables: Vec<String> = vec![];

    // header
    let mut in_define = false;
    let mut reached_begin = false;
    for (idx, raw) in lines.by_ref() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let cmd = fields.next().unwrap_or_default().to_ascii_lowercase();

        if in_define {
            if cmd == ".enddefine" {
                in_define = false;
            }
            continue;
        }
        if !cmd.starts_with('.') {
            return Err(real_error(lineno, "invalid file header"));
        }

        match cmd.as_str() {
            ".begin" => {
                reached_begin = true;
                break;
            }
            ".numvars" => {
                declared = fields
                    .next()
                    .and_then(|f| f.parse().ok())
                    .ok_or_else(|| real_error(lineno, "invalid '.numvars' line"))?;
            }
            ".variables" => {
                for variable in fields {
                    if variable.starts_with('.') {
                        return Err(real_error(lineno, "invalid or insufficient variables declared"));
                    }
                    qc.add_qubit_register(1, variable)?;
                    qc.add_classical_register(1, &format!("c_{variable}"))?;
                    variables.push(variable.to_string());
                }
                if variables.len() != declared as usize {
                    return Err(real_error(lineno, "invalid or insufficient variables declared"));
                }
            }
            ".constants" => {
                let values = fields
                    .next()
                    .ok_or_else(|| real_error(lineno, "failed read in '.constants' line"))?;
                if values.len() != declared as usize {
                    return Err(real_error(lineno, "failed read in '.constants' line"));
                }
                for (i, value) in values.chars().enumerate() {
                    match value {
                        '1' => {
                            let total = qc.total_qubits();
                            qc.push(StandardOperation::new(total, OpType::X, QubitId(i as u32)));
                        }
                        '0' | '-' => {}
                        other => {
                            return Err(real_error(
                                lineno,
                                format!("invalid value in '.constants' header: '{other}'"),
                            ));
                        }
                    }
                }
            }
            ".inputs" | ".outputs" | ".garbage" | ".version" | ".inputbus" | ".outputbus" => {
                tracing::debug!(command = %cmd, line = lineno, "skipping unsupported header command");
            }
            ".define" => {
                tracing::warn!(
                    line = lineno,
                    "file contains a 'define' statement, which is not supported and skipped"
                );
                in_define = true;
            }
            other => {
                return Err(real_error(lineno, format!("unknown command: {other}")));
            }
        }
    }
    if !reached_begin {
        return Err(real_error(0, "invalid file header: missing '.begin'"));
    }

    // gate descriptions
    for (idx, raw) in lines {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let cmd = fields.next().unwrap_or_default().to_ascii_lowercase();
        if cmd == ".end" {
            break;
        }

        let caps = GATE_RE
            .captures(&cmd)
            .ok_or_else(|| real_error(lineno, format!("unsupported gate detected: {cmd}")))?;
        let id = caps.get(1).map_or("", |m| m.as_str());
        let count: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let divisor: f64 = caps
            .get(3)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0.0);

        // `t` is the Toffoli family in this format
        let gate = if id == "t" {
            OpType::X
        } else {
            real_gate(id)
                .ok_or_else(|| real_error(lineno, format!("unknown gate identifier: {id}")))?
        };

        let ncontrols = match count {
            Some(n) => (n as usize).saturating_sub(1),
            // line-count-free forms imply the operand structure
            None => match gate {
                OpType::V | OpType::Vdag => 1,
                OpType::Peres | OpType::PeresDag => 2,
                _ => 0,
            },
        };
        if ncontrols as u32 >= qc.total_qubits() {
            return Err(real_error(
                lineno,
                format!(
                    "gate acts on {} qubits, but only {} qubits are available",
                    ncontrols + 1,
                    qc.total_qubits()
                ),
            ));
        }

        let mut controls: Vec<Control> = vec![];
        for _ in 0..ncontrols {
            let mut label = fields
                .next()
                .ok_or_else(|| real_error(lineno, format!("too few variables for gate {id}")))?;
            let negative = label.starts_with('-');
            if negative {
                label = &label[1..];
            }
            let reg = qc
                .quantum_register(label)
                .ok_or_else(|| real_error(lineno, format!("label {label} not found")))?;
            let qubit = QubitId(reg.start);
            controls.push(if negative {
                Control::neg(qubit)
            } else {
                Control::pos(qubit)
            });
        }
        let target_label = fields
            .next()
            .ok_or_else(|| real_error(lineno, format!("too few variables (no target) for gate {id}")))?;
        let target = QubitId(
            qc.quantum_register(target_label)
                .ok_or_else(|| real_error(lineno, format!("label {target_label} not found")))?
                .start,
        );

        let total = qc.total_qubits();
        let op: Operation = match gate {
            OpType::X => StandardOperation::controlled(total, OpType::X, controls, target).into(),

            OpType::I
            | OpType::H
            | OpType::Y
            | OpType::Z
            | OpType::S
            | OpType::Sdag
            | OpType::T
            | OpType::Tdag
            | OpType::V
            | OpType::Vdag => StandardOperation::controlled(total, gate, controls, target).into(),

            OpType::Rx | OpType::Ry => {
                StandardOperation::controlled(total, gate, controls, target)
                    .with_params(&[PI / divisor])
                    .into()
            }

            OpType::Rz => {
                let rounded = divisor.round();
                if (divisor - rounded).abs() < REAL_DIVISOR_TOLERANCE {
                    match rounded as i64 {
                        1 | -1 => {
                            StandardOperation::controlled(total, OpType::Z, controls, target).into()
                        }
                        2 => StandardOperation::controlled(total, OpType::S, controls, target)
                            .into(),
                        -2 => StandardOperation::controlled(total, OpType::Sdag, controls, target)
                            .into(),
                        4 => StandardOperation::controlled(total, OpType::T, controls, target)
                            .into(),
                        -4 => StandardOperation::controlled(total, OpType::Tdag, controls, target)
                            .into(),
                        _ => StandardOperation::controlled(total, OpType::Rz, controls, target)
                            .with_params(&[PI / rounded])
                            .into(),
                    }
                } else {
                    StandardOperation::controlled(total, OpType::Rz, controls, target)
                        .with_params(&[PI / divisor])
                        .into()
                }
            }

            OpType::Swap | OpType::Peres | OpType::PeresDag => {
                let second = controls
                    .pop()
                    .ok_or_else(|| real_error(lineno, format!("too few variables for gate {id}")))?
                    .qubit;
                StandardOperation::two_target(total, gate, controls, target, second).into()
            }

            other => {
                return Err(real_error(
                    lineno,
                    format!("operation with invalid type '{}' in real file", other.name()),
                ));
            }
        };
        qc.push(op);
    }

    Ok(qc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfr_ir::Polarity;

    #[test]
    fn test_toffoli() {
        let source = ".numvars 3\n.variables a b c\n.begin\nt3 a b c\n.end\n";
        let qc = parse(source).unwrap();
        assert_eq!(qc.num_qubits(), 3);
        assert_eq!(qc.num_ops(), 1);

        match &qc.ops()[0] {
            Operation::Standard(op) => {
                assert_eq!(op.op, OpType::X);
                assert_eq!(op.controls.len(), 2);
                assert_eq!(op.controls[0].qubit, QubitId(0));
                assert_eq!(op.controls[1].qubit, QubitId(1));
                assert_eq!(op.targets[0], QubitId(2));
            }
            other => panic!("expected Toffoli, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_control() {
        let source = ".numvars 2\n.variables a b\n.begin\nt2 -a b\n.end\n";
        let qc = parse(source).unwrap();
        match &qc.ops()[0] {
            Operation::Standard(op) => {
                assert_eq!(op.controls[0].polarity, Polarity::Neg);
                assert_eq!(op.controls[0].qubit, QubitId(0));
            }
            other => panic!("expected controlled X, got {other:?}"),
        }
    }

    #[test]
    fn test_constants_inject_x() {
        let source = ".numvars 2\n.variables a b\n.constants 01\n.begin\nt1 a\n.end\n";
        let qc = parse(source).unwrap();
        // the '1' constant on b becomes an X before the listed gates
        match &qc.ops()[0] {
            Operation::Standard(op) => {
                assert_eq!(op.op, OpType::X);
                assert_eq!(op.targets[0], QubitId(1));
            }
            other => panic!("expected X, got {other:?}"),
        }
        assert_eq!(qc.num_ops(), 2);
    }

    #[test]
    fn test_divisor_canonicalisation() {
        let source = "\
.numvars 1
.variables a
.begin
q1:1 a
q1:2 a
q1:-2 a
q1:4 a
q1:-4 a
q1:3 a
.end
";
        let qc = parse(source).unwrap();
        let kinds: Vec<OpType> = qc
            .ops()
            .iter()
            .map(|op| match op {
                Operation::Standard(s) => s.op,
                other => panic!("expected standard op, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![OpType::Z, OpType::S, OpType::Sdag, OpType::T, OpType::Tdag, OpType::Rz]
        );
        match &qc.ops()[5] {
            Operation::Standard(op) => assert!((op.params[0] - PI / 3.0).abs() < 1e-12),
            other => panic!("expected rz, got {other:?}"),
        }
    }

    #[test]
    fn test_fredkin_two_targets() {
        let source = ".numvars 3\n.variables a b c\n.begin\nf3 a b c\n.end\n";
        let qc = parse(source).unwrap();
        match &qc.ops()[0] {
            Operation::Standard(op) => {
                assert_eq!(op.op, OpType::Swap);
                assert_eq!(op.controls.len(), 1);
                assert_eq!(op.controls[0].qubit, QubitId(0));
                assert_eq!(op.targets.as_slice(), &[QubitId(2), QubitId(1)]);
            }
            other => panic!("expected Fredkin, got {other:?}"),
        }
    }

    #[test]
    fn test_define_skipped_with_notice() {
        let source = "\
.numvars 1
.variables a
.define
foo bar
.enddefine
.begin
t1 a
.end
";
        let qc = parse(source).unwrap();
        assert_eq!(qc.num_ops(), 1);
    }

    #[test]
    fn test_unknown_gate_rejected() {
        let source = ".numvars 1\n.variables a\n.begin\nk1 a\n.end\n";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, FormatError::Real { .. }));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let source = ".numvars 1\n.variables a\n.begin\nt1 zz\n.end\n";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, FormatError::Real { .. }));
    }
}
