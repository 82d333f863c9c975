//! Toffoli `.tfc` parser.
//!
//! The header declares variables (`.v`), inputs (`.i`), outputs (`.o`) and
//! constants (`.c`). Non-input variables become ancillary qubits; a
//! constant `1` injects an initial X. Bodies are `t<k>` multi-controlled X
//! gates and `f<k>` SWAPs; a `'` suffix marks a negative control.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use qfr_ir::{Control, OpType, QuantumComputation, QubitId, StandardOperation};

use crate::error::{FormatError, FormatResult};

static GATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([tTfF])(\d+)$").expect("gate regex is valid"));

fn tfc_error(line: usize, message: impl Into<String>) -> FormatError {
    FormatError::Tfc {
        line,
        message: message.into(),
    }
}

fn comma_list(rest: &str) -> Vec<String> {
    rest.split(',').map(|s| s.trim().to_string()).collect()
}

/// Parse `.tfc` source into a computation.
pub fn parse(source: &str) -> FormatResult<QuantumComputation> {
    parse_named(source, "tfc")
}

/// Parse `.tfc` source, naming the circuit.
pub fn parse_named(source: &str, name: &str) -> FormatResult<QuantumComputation> {
    let mut qc = QuantumComputation::new(name);
    let mut lines = source.lines().enumerate();

    let mut variables: Vec<String> = vec![];
    let mut inputs: Vec<String> = vec![];
    let mut outputs: Vec<String> = vec![];
    let mut constants: Vec<String> = vec![];

    // header
    let mut reached_begin = false;
    for (idx, raw) in lines.by_ref() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("begin") {
            reached_begin = true;
            break;
        }
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        match cmd {
            ".v" => variables = comma_list(rest),
            ".i" => {
                for variable in comma_list(rest) {
                    if !variables.contains(&variable) {
                        return Err(tfc_error(
                            lineno,
                            format!("unknown variable in input statement: {variable}"),
                        ));
                    }
                    inputs.push(variable);
                }
            }
            ".o" => {
                for variable in comma_list(rest) {
                    if !variables.contains(&variable) {
                        return Err(tfc_error(
                            lineno,
                            format!("unknown variable in output statement: {variable}"),
                        ));
                    }
                    outputs.push(variable);
                }
            }
            ".c" => constants = comma_list(rest),
            ".ol" => {
                tracing::debug!(line = lineno, "ignoring output labels");
            }
            other => {
                return Err(tfc_error(lineno, format!("unknown command: {other}")));
            }
        }
    }
    if !reached_begin {
        return Err(tfc_error(0, "invalid file header: missing 'begin'"));
    }

    // inputs form the data register, the rest become ancillae
    qc.add_qubit_register(inputs.len() as u32, "q")?;
    let nconstants = variables.len() - inputs.len();
    if nconstants > 0 {
        qc.add_ancillary_register(nconstants as u32, "anc")?;
    }

    let mut var_map: FxHashMap<String, u32> = FxHashMap::default();
    let mut qidx = 0u32;
    let mut constidx = inputs.len() as u32;
    for variable in &variables {
        if inputs.contains(variable) {
            var_map.insert(variable.clone(), qidx);
            qidx += 1;
        } else {
            let value = constants
                .get((constidx as usize) - inputs.len())
                .map(String::as_str)
                .unwrap_or("");
            match value {
                "1" => {
                    let total = qc.total_qubits();
                    qc.push(StandardOperation::new(total, OpType::X, QubitId(constidx)));
                }
                "0" => {}
                other => {
                    return Err(tfc_error(0, format!("non-binary constant specified: {other}")));
                }
            }
            var_map.insert(variable.clone(), constidx);
            constidx += 1;
        }
    }

    // layouts follow the variable order; non-output variables are garbage
    for (position, variable) in variables.iter().enumerate() {
        let q = QubitId(position as u32);
        let p = QubitId(var_map[variable]);
        qc.initial_layout_mut().insert(q, p);
        if outputs.contains(variable) {
            qc.output_permutation_mut().insert(q, p);
        } else {
            qc.output_permutation_mut().remove(&q);
            qc.set_garbage(p);
        }
    }

    // gate descriptions
    for (idx, raw) in lines {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("end") {
            break;
        }
        let (cmd, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .ok_or_else(|| tfc_error(lineno, "failed to read command"))?;

        let caps = GATE_RE
            .captures(cmd)
            .ok_or_else(|| tfc_error(lineno, format!("unsupported gate detected: {cmd}")))?;
        let is_toffoli = matches!(caps.get(1).map(|m| m.as_str()), Some("t" | "T"));
        let count: usize = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        let ncontrols = count.saturating_sub(1);
        if ncontrols as u32 >= qc.total_qubits() {
            return Err(tfc_error(
                lineno,
                format!(
                    "gate acts on {} qubits, but only {} qubits are available",
                    ncontrols + 1,
                    qc.total_qubits()
                ),
            ));
        }

        let mut operands: Vec<Control> = vec![];
        for label in comma_list(rest) {
            let (label, negative) = match label.strip_suffix('\'') {
                Some(stripped) => (stripped.to_string(), true),
                None => (label, false),
            };
            let qubit = QubitId(
                *var_map
                    .get(&label)
                    .ok_or_else(|| tfc_error(lineno, format!("label {label} not found")))?,
            );
            operands.push(if negative {
                Control::neg(qubit)
            } else {
                Control::pos(qubit)
            });
        }

        let total = qc.total_qubits();
        if is_toffoli {
            let target = operands
                .pop()
                .ok_or_else(|| tfc_error(lineno, "missing target"))?
                .qubit;
            qc.push(StandardOperation::controlled(total, OpType::X, operands, target));
        } else {
            let target0 = operands
                .pop()
                .ok_or_else(|| tfc_error(lineno, "missing target"))?
                .qubit;
            let target1 = operands
                .pop()
                .ok_or_else(|| tfc_error(lineno, "missing target"))?
                .qubit;
            qc.push(StandardOperation::two_target(
                total,
                OpType::Swap,
                operands,
                target0,
                target1,
            ));
        }
    }

    Ok(qc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfr_ir::{Operation, Polarity};

    #[test]
    fn test_constant_ancilla_and_toffoli() {
        let source = "\
.v a,b,c
.i a,b
.o c
.c 1
BEGIN
t3 a,b,c
END
";
        let qc = parse(source).unwrap();
        assert_eq!(qc.num_qubits(), 2);
        assert_eq!(qc.num_ancillae(), 1);
        assert!(qc.is_ancillary(QubitId(2)));

        // constant 1 injects an X on the ancilla before the Toffoli
        assert_eq!(qc.num_ops(), 2);
        match &qc.ops()[0] {
            Operation::Standard(op) => {
                assert_eq!(op.op, OpType::X);
                assert!(op.controls.is_empty());
                assert_eq!(op.targets[0], QubitId(2));
            }
            other => panic!("expected X, got {other:?}"),
        }
        match &qc.ops()[1] {
            Operation::Standard(op) => {
                assert_eq!(op.op, OpType::X);
                assert_eq!(op.controls.len(), 2);
                assert_eq!(op.targets[0], QubitId(2));
            }
            other => panic!("expected Toffoli, got {other:?}"),
        }

        // non-output variables are garbage; the output stays observed
        assert!(qc.is_garbage(QubitId(0)));
        assert!(qc.is_garbage(QubitId(1)));
        assert!(!qc.is_garbage(QubitId(2)));
        assert_eq!(qc.output_permutation().len(), 1);
        assert_eq!(qc.output_permutation().get(&QubitId(2)), Some(&QubitId(2)));
    }

    #[test]
    fn test_negative_control_suffix() {
        let source = ".v a,b\n.i a,b\n.o b\nBEGIN\nt2 a',b\nEND\n";
        let qc = parse(source).unwrap();
        match &qc.ops()[0] {
            Operation::Standard(op) => {
                assert_eq!(op.controls[0].polarity, Polarity::Neg);
            }
            other => panic!("expected controlled X, got {other:?}"),
        }
    }

    #[test]
    fn test_fredkin_swaps_last_two() {
        let source = ".v a,b,c\n.i a,b,c\n.o a,b,c\nBEGIN\nf3 a,b,c\nEND\n";
        let qc = parse(source).unwrap();
        match &qc.ops()[0] {
            Operation::Standard(op) => {
                assert_eq!(op.op, OpType::Swap);
                assert_eq!(op.controls.len(), 1);
                assert_eq!(op.targets.as_slice(), &[QubitId(2), QubitId(1)]);
            }
            other => panic!("expected Fredkin, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_input_variable_rejected() {
        let source = ".v a\n.i a,b\nBEGIN\nEND\n";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, FormatError::Tfc { .. }));
    }

    #[test]
    fn test_non_binary_constant_rejected() {
        let source = ".v a,b\n.i a\n.o a\n.c x\nBEGIN\nt1 a\nEND\n";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, FormatError::Tfc { .. }));
    }
}
