//! Canonical OpenQASM 2.0 emission.
//!
//! The canonical form: inverse-layout comment lines, the version header,
//! `include "qelib1.inc";`, register declarations sorted by start index,
//! then one line per operation. Measurements, resets and barriers fold to
//! whole-register form when both sides cover a full register. Physical
//! qubits missing below the highest index are back-filled as fresh data
//! qubits absent from the output permutation.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use qfr_ir::register::sorted_by_start;
use qfr_ir::{
    ClbitId, NonUnitaryOperation, OpType, Operation, Polarity, QuantumComputation, QubitId,
    Register, RegisterMap, StandardOperation, DEFAULT_ANCREG, DEFAULT_CREG, DEFAULT_QREG,
};

use crate::error::{ParseError, ParseResult};

/// Emit a computation in the canonical OpenQASM 2.0 form.
pub fn emit(qc: &QuantumComputation) -> ParseResult<String> {
    let mut qc = qc.clone();
    backfill_missing_qubits(&mut qc)?;

    let mut emitter = Emitter::new(&qc);
    emitter.emit_circuit(&qc)?;
    Ok(emitter.output)
}

/// Insert fresh data qubits for physical indices below the highest used
/// index that are absent from the initial layout. The new qubits carry no
/// output index.
fn backfill_missing_qubits(qc: &mut QuantumComputation) -> ParseResult<()> {
    if qc.quantum_registers().is_empty() {
        return Ok(());
    }
    let Some(max_phys) = qc.initial_layout().keys().max().copied() else {
        return Ok(());
    };
    for phys in 0..max_phys.0 {
        if !qc.initial_layout().contains_key(&QubitId(phys)) {
            // smallest logical index not yet in the image keeps the layout
            // injective
            let mut logical = 0u32;
            while qc.initial_layout().values().any(|l| l.0 == logical) {
                logical += 1;
            }
            qc.add_qubit(QubitId(logical), QubitId(phys), None)?;
        }
    }
    Ok(())
}

struct Emitter {
    output: String,
    /// `name[i]` strings per physical qubit index (data then ancillary).
    qnames: Vec<String>,
    /// `name[i]` strings per classical bit index.
    cnames: Vec<String>,
}

impl Emitter {
    fn new(qc: &QuantumComputation) -> Self {
        let mut qnames = reg_names(qc.quantum_registers(), qc.num_qubits(), DEFAULT_QREG);
        qnames.extend(reg_names(
            qc.ancillary_registers(),
            qc.num_ancillae(),
            DEFAULT_ANCREG,
        ));
        let cnames = reg_names(qc.classical_registers(), qc.num_classics(), DEFAULT_CREG);
        Self {
            output: String::new(),
            qnames,
            cnames,
        }
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }

    fn emit_circuit(&mut self, qc: &QuantumComputation) -> ParseResult<()> {
        // layout comments reflect the inverse permutations
        let inverse_initial: BTreeMap<QubitId, QubitId> = qc
            .initial_layout()
            .iter()
            .map(|(phys, logical)| (*logical, *phys))
            .collect();
        let mut line = String::from("// i");
        for phys in inverse_initial.values() {
            line.push_str(&format!(" {}", phys.0));
        }
        self.writeln(&line);

        let inverse_output: BTreeMap<QubitId, QubitId> = qc
            .output_permutation()
            .iter()
            .map(|(phys, logical)| (*logical, *phys))
            .collect();
        let mut line = String::from("// o");
        for phys in inverse_output.values() {
            line.push_str(&format!(" {}", phys.0));
        }
        self.writeln(&line);

        self.writeln("OPENQASM 2.0;");
        self.writeln("include \"qelib1.inc\";");

        self.emit_registers(qc.quantum_registers(), "qreg", qc.num_qubits(), DEFAULT_QREG);
        self.emit_registers(qc.classical_registers(), "creg", qc.num_classics(), DEFAULT_CREG);
        self.emit_registers(qc.ancillary_registers(), "qreg", qc.num_ancillae(), DEFAULT_ANCREG);

        for op in qc.ops() {
            self.emit_op(qc, op, "")?;
        }
        Ok(())
    }

    fn emit_registers(&mut self, regs: &RegisterMap, keyword: &str, count: u32, default: &str) {
        if regs.is_empty() {
            if count > 0 {
                self.writeln(&format!("{keyword} {default}[{count}];"));
            }
            return;
        }
        for (name, reg) in sorted_by_start(regs) {
            self.writeln(&format!("{keyword} {name}[{}];", reg.size));
        }
    }

    fn emit_op(&mut self, qc: &QuantumComputation, op: &Operation, prefix: &str) -> ParseResult<()> {
        match op {
            Operation::Standard(s) => self.emit_standard(s, prefix),
            Operation::Compound(c) => {
                for child in &c.ops {
                    self.emit_op(qc, child, prefix)?;
                }
                Ok(())
            }
            Operation::NonUnitary(n) => self.emit_non_unitary(qc, n, prefix),
            Operation::ClassicControlled(cc) => {
                let creg = find_register(
                    qc.classical_registers(),
                    Register::new(cc.creg_start.0, cc.creg_size),
                )
                .ok_or_else(|| {
                    ParseError::Unsupported(
                        "classically controlled operation over an unnamed classical slice".into(),
                    )
                })?;
                let prefix = format!("{prefix}if({creg}=={}) ", cc.expected);
                self.emit_op(qc, &cc.op, &prefix)
            }
        }
    }

    fn emit_standard(&mut self, op: &StandardOperation, prefix: &str) -> ParseResult<()> {
        // negative controls are conjugated with X
        let negated: Vec<QubitId> = op
            .controls
            .iter()
            .filter(|c| c.polarity == Polarity::Neg)
            .map(|c| c.qubit)
            .collect();
        for q in &negated {
            let q = self.qname(*q)?.to_string();
            self.writeln(&format!("x {q};"));
        }

        self.emit_standard_line(op, prefix)?;

        for q in &negated {
            let q = self.qname(*q)?.to_string();
            self.writeln(&format!("x {q};"));
        }
        Ok(())
    }

    fn emit_standard_line(&mut self, op: &StandardOperation, prefix: &str) -> ParseResult<()> {
        let k = op.controls.len();
        let base = match op.op {
            OpType::I => "id",
            OpType::H => "h",
            OpType::X => "x",
            OpType::Y => "y",
            OpType::Z => "z",
            OpType::S => "s",
            OpType::Sdag => "sdg",
            OpType::T => "t",
            OpType::Tdag => "tdg",
            OpType::V => "sx",
            OpType::Vdag => "sxdg",
            OpType::Rx => "rx",
            OpType::Ry => "ry",
            OpType::Rz => "rz",
            OpType::U1 => "u1",
            OpType::U2 => "u2",
            OpType::U3 => "u3",
            OpType::Swap => "swap",
            OpType::ISwap => {
                if k > 0 {
                    return Err(ParseError::Unsupported(
                        "controlled iSWAP has no OpenQASM form".into(),
                    ));
                }
                return self.emit_iswap(op, prefix);
            }
            OpType::Peres | OpType::PeresDag => return self.emit_peres(op, prefix),
            kind => {
                return Err(ParseError::Unsupported(format!(
                    "operation '{}' has no OpenQASM form",
                    kind.name()
                )));
            }
        };

        let mut line = format!("{prefix}{}{base}", "c".repeat(k));
        if !op.params.is_empty() {
            let params: Vec<String> = op.params.iter().map(|v| fmt_param(*v)).collect();
            line.push_str(&format!("({})", params.join(",")));
        }
        line.push(' ');

        let mut operands = vec![];
        for c in &op.controls {
            operands.push(self.qname(c.qubit)?.to_string());
        }
        for t in &op.targets {
            operands.push(self.qname(*t)?.to_string());
        }
        line.push_str(&operands.join(", "));
        line.push(';');
        self.writeln(&line);
        Ok(())
    }

    fn emit_iswap(&mut self, op: &StandardOperation, prefix: &str) -> ParseResult<()> {
        let a = self.qname(op.targets[0])?.to_string();
        let b = self.qname(op.targets[1])?.to_string();
        for line in [
            format!("{prefix}s {a};"),
            format!("{prefix}s {b};"),
            format!("{prefix}h {a};"),
            format!("{prefix}cx {a}, {b};"),
            format!("{prefix}cx {b}, {a};"),
            format!("{prefix}h {b};"),
        ] {
            self.writeln(&line);
        }
        Ok(())
    }

    /// Peres: a Toffoli onto the first target followed by an X chain onto
    /// the second; the inverse order for its adjoint.
    fn emit_peres(&mut self, op: &StandardOperation, prefix: &str) -> ParseResult<()> {
        let k = op.controls.len();
        let mut controls = vec![];
        for c in &op.controls {
            controls.push(self.qname(c.qubit)?.to_string());
        }
        let t0 = self.qname(op.targets[0])?.to_string();
        let t1 = self.qname(op.targets[1])?.to_string();

        let toffoli = {
            let mut operands = controls.clone();
            operands.push(t1.clone());
            operands.push(t0);
            format!("{prefix}{}x {};", "c".repeat(k + 1), operands.join(", "))
        };
        let chain = {
            let mut operands = controls;
            operands.push(t1);
            format!("{prefix}{}x {};", "c".repeat(k), operands.join(", "))
        };

        match op.op {
            OpType::Peres => {
                self.writeln(&toffoli);
                self.writeln(&chain);
            }
            _ => {
                self.writeln(&chain);
                self.writeln(&toffoli);
            }
        }
        Ok(())
    }

    fn emit_non_unitary(
        &mut self,
        qc: &QuantumComputation,
        op: &NonUnitaryOperation,
        prefix: &str,
    ) -> ParseResult<()> {
        match op.kind {
            OpType::Measure => {
                let folded = full_quantum_register(qc, &op.qubits)
                    .zip(full_register(qc.classical_registers(), &clbit_indices(&op.classics)));
                if let Some((qreg, creg)) = folded {
                    self.writeln(&format!("{prefix}measure {qreg} -> {creg};"));
                } else {
                    for (q, c) in op.qubits.iter().zip(op.classics.iter()) {
                        let q = self.qname(*q)?.to_string();
                        let c = self.cname(*c)?.to_string();
                        self.writeln(&format!("{prefix}measure {q} -> {c};"));
                    }
                }
            }
            OpType::Reset => {
                if let Some(qreg) = full_quantum_register(qc, &op.qubits) {
                    self.writeln(&format!("{prefix}reset {qreg};"));
                } else {
                    for q in &op.qubits {
                        let q = self.qname(*q)?.to_string();
                        self.writeln(&format!("{prefix}reset {q};"));
                    }
                }
            }
            OpType::Barrier => {
                if let Some(qreg) = full_quantum_register(qc, &op.qubits) {
                    self.writeln(&format!("{prefix}barrier {qreg};"));
                } else {
                    for q in &op.qubits {
                        let q = self.qname(*q)?.to_string();
                        self.writeln(&format!("{prefix}barrier {q};"));
                    }
                }
            }
            OpType::Snapshot => {
                let mut operands = vec![];
                for q in &op.qubits {
                    operands.push(self.qname(*q)?.to_string());
                }
                self.writeln(&format!(
                    "{prefix}snapshot({}) {};",
                    op.arg.unwrap_or(0),
                    operands.join(", ")
                ));
            }
            OpType::ShowProbabilities => {
                self.writeln(&format!("{prefix}show_probabilities;"));
            }
            kind => {
                return Err(ParseError::Unsupported(format!(
                    "non-unitary kind '{}' has no OpenQASM form",
                    kind.name()
                )));
            }
        }
        Ok(())
    }

    fn qname(&self, q: QubitId) -> ParseResult<&str> {
        self.qnames
            .get(q.0 as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                ParseError::Unsupported(format!("qubit {} is not covered by any register", q.0))
            })
    }

    fn cname(&self, c: ClbitId) -> ParseResult<&str> {
        self.cnames
            .get(c.0 as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                ParseError::Unsupported(format!(
                    "classical bit {} is not covered by any register",
                    c.0
                ))
            })
    }
}

/// Per-index `name[i]` strings over a register map sorted by start index,
/// or a default register when the map is empty.
fn reg_names(regs: &RegisterMap, default_count: u32, default_name: &str) -> Vec<String> {
    let mut names = vec![];
    if regs.is_empty() {
        for i in 0..default_count {
            names.push(format!("{default_name}[{i}]"));
        }
    } else {
        for (name, reg) in sorted_by_start(regs) {
            for i in 0..reg.size {
                names.push(format!("{name}[{i}]"));
            }
        }
    }
    names
}

fn clbit_indices(classics: &[ClbitId]) -> Vec<u32> {
    classics.iter().map(|c| c.0).collect()
}

/// The register name iff the indices are exactly one register's full run
/// in ascending order.
fn full_register(regs: &RegisterMap, indices: &[u32]) -> Option<String> {
    let first = *indices.first()?;
    let (name, reg) = regs.iter().find(|(_, r)| r.contains(first))?;
    let run: Vec<u32> = (reg.start..reg.end()).collect();
    (indices == run).then(|| name.clone())
}

fn full_quantum_register(qc: &QuantumComputation, qubits: &[QubitId]) -> Option<String> {
    let indices: Vec<u32> = qubits.iter().map(|q| q.0).collect();
    full_register(qc.quantum_registers(), &indices)
        .or_else(|| full_register(qc.ancillary_registers(), &indices))
}

fn find_register(regs: &RegisterMap, wanted: Register) -> Option<String> {
    regs.iter()
        .find(|(_, reg)| **reg == wanted)
        .map(|(name, _)| name.clone())
}

/// Render a parameter, preferring exact π fractions and falling back to
/// the shortest decimal that round-trips.
fn fmt_param(v: f64) -> String {
    const FRACTIONS: &[(f64, &str)] = &[
        (PI, "pi"),
        (PI / 2.0, "pi/2"),
        (PI / 4.0, "pi/4"),
        (PI / 8.0, "pi/8"),
        (2.0 * PI, "2*pi"),
    ];
    if v == 0.0 {
        return "0".into();
    }
    for (value, text) in FRACTIONS {
        if (v - value).abs() < 1e-14 {
            return (*text).into();
        }
        if (v + value).abs() < 1e-14 {
            return format!("-{text}");
        }
    }
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_emit_header_and_registers() {
        let qc = parse("OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];").unwrap();
        let out = emit(&qc).unwrap();
        assert!(out.starts_with("// i 0 1\n"));
        assert!(out.contains("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n"));
        assert!(out.contains("qreg q[2];"));
        assert!(out.contains("creg c[2];"));
        assert!(out.contains("h q[0];"));
    }

    #[test]
    fn test_emit_folds_whole_register_measure() {
        let qc = parse(
            "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;",
        )
        .unwrap();
        let out = emit(&qc).unwrap();
        assert!(out.contains("measure q -> c;"));
        assert!(!out.contains("measure q[0]"));
    }

    #[test]
    fn test_emit_single_measure_not_folded() {
        let qc =
            parse("OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q;\nmeasure q[0] -> c[1];").unwrap();
        let out = emit(&qc).unwrap();
        assert!(out.contains("measure q[0] -> c[1];"));
    }

    #[test]
    fn test_emit_param_formats() {
        assert_eq!(fmt_param(0.0), "0");
        assert_eq!(fmt_param(PI), "pi");
        assert_eq!(fmt_param(-PI / 2.0), "-pi/2");
        assert_eq!(fmt_param(0.5), "0.5");
        // shortest round-trip decimal survives reparsing exactly
        let v = 1.234_567_890_123_4_f64;
        assert_eq!(fmt_param(v).parse::<f64>().unwrap(), v);
    }

    #[test]
    fn test_emit_multi_control_chain() {
        let qc = parse("OPENQASM 2.0;\nqreg q[4];\nccx q[0],q[1],q[2];").unwrap();
        let out = emit(&qc).unwrap();
        assert!(out.contains("ccx q[0], q[1], q[2];"));
    }

    #[test]
    fn test_emit_classically_controlled() {
        let qc = parse(
            "OPENQASM 2.0;\nqreg q[1];\ncreg c[1];\nmeasure q -> c;\nif (c == 1) x q[0];",
        )
        .unwrap();
        let out = emit(&qc).unwrap();
        assert!(out.contains("if(c==1) x q[0];"));
    }

    #[test]
    fn test_emit_backfills_missing_physical_qubit() {
        use qfr_ir::QuantumComputation;
        let mut qc = QuantumComputation::new("gap");
        qc.add_qubit_register(3, "q").unwrap();
        qc.remove_qubit(qfr_ir::QubitId(1)).unwrap();

        let out = emit(&qc).unwrap();
        // the hole at physical index 1 is declared again
        assert!(out.contains("qreg q[3];") || out.contains("q_l") || out.contains("q_h"));
        let reparsed = parse(&out).unwrap();
        assert_eq!(reparsed.num_qubits(), 3);
    }
}
