//! The operation sequence IR: standard, compound, non-unitary and
//! classically controlled operations.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::fmt::Write as _;

use crate::qubit::{ClbitId, Permutation, QubitId};

/// Control polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Fire when the control qubit is |1⟩.
    Pos,
    /// Fire when the control qubit is |0⟩.
    Neg,
}

/// A control line: a qubit together with its polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// The controlling qubit (physical index).
    pub qubit: QubitId,
    /// Polarity of the control.
    pub polarity: Polarity,
}

impl Control {
    /// A positive control on `qubit`.
    pub fn pos(qubit: QubitId) -> Self {
        Self {
            qubit,
            polarity: Polarity::Pos,
        }
    }

    /// A negative control on `qubit`.
    pub fn neg(qubit: QubitId) -> Self {
        Self {
            qubit,
            polarity: Polarity::Neg,
        }
    }
}

/// The kind of a parameterised unitary, plus the non-unitary kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpType {
    I,
    H,
    X,
    Y,
    Z,
    S,
    Sdag,
    T,
    Tdag,
    V,
    Vdag,
    Rx,
    Ry,
    Rz,
    U1,
    U2,
    U3,
    Swap,
    ISwap,
    Peres,
    PeresDag,
    // non-unitary kinds
    Measure,
    Reset,
    Barrier,
    Snapshot,
    ShowProbabilities,
}

impl OpType {
    /// Printable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            OpType::I => "id",
            OpType::H => "h",
            OpType::X => "x",
            OpType::Y => "y",
            OpType::Z => "z",
            OpType::S => "s",
            OpType::Sdag => "sdg",
            OpType::T => "t",
            OpType::Tdag => "tdg",
            OpType::V => "v",
            OpType::Vdag => "vdg",
            OpType::Rx => "rx",
            OpType::Ry => "ry",
            OpType::Rz => "rz",
            OpType::U1 => "u1",
            OpType::U2 => "u2",
            OpType::U3 => "u3",
            OpType::Swap => "swap",
            OpType::ISwap => "iswap",
            OpType::Peres => "peres",
            OpType::PeresDag => "peresdg",
            OpType::Measure => "measure",
            OpType::Reset => "reset",
            OpType::Barrier => "barrier",
            OpType::Snapshot => "snapshot",
            OpType::ShowProbabilities => "show_probabilities",
        }
    }

    /// Whether this kind denotes a unitary gate.
    pub fn is_unitary(self) -> bool {
        !matches!(
            self,
            OpType::Measure
                | OpType::Reset
                | OpType::Barrier
                | OpType::Snapshot
                | OpType::ShowProbabilities
        )
    }

    /// Whether this kind acts on two targets.
    pub fn is_two_target(self) -> bool {
        matches!(
            self,
            OpType::Swap | OpType::ISwap | OpType::Peres | OpType::PeresDag
        )
    }

    /// Number of real parameters this kind carries.
    pub fn num_params(self) -> usize {
        match self {
            OpType::Rx | OpType::Ry | OpType::Rz | OpType::U1 => 1,
            OpType::U2 => 2,
            OpType::U3 => 3,
            _ => 0,
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parameterised unitary on one target (or two targets for the
/// two-target kinds) with zero or more controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardOperation {
    /// Width of the circuit this operation belongs to.
    pub nqubits: u32,
    /// The gate kind.
    pub op: OpType,
    /// Control lines.
    pub controls: Vec<Control>,
    /// Target qubits (physical indices). Two entries for SWAP-like kinds.
    pub targets: SmallVec<[QubitId; 2]>,
    /// Up to three real parameters. Meaning depends on `op`:
    /// `[theta]` for rotations, `[theta, phi, lambda]` for U3.
    pub params: SmallVec<[f64; 3]>,
}

impl StandardOperation {
    /// An uncontrolled, unparameterised gate on a single target.
    pub fn new(nqubits: u32, op: OpType, target: QubitId) -> Self {
        Self {
            nqubits,
            op,
            controls: vec![],
            targets: SmallVec::from_slice(&[target]),
            params: SmallVec::new(),
        }
    }

    /// A controlled gate on a single target.
    pub fn controlled(nqubits: u32, op: OpType, controls: Vec<Control>, target: QubitId) -> Self {
        Self {
            nqubits,
            op,
            controls,
            targets: SmallVec::from_slice(&[target]),
            params: SmallVec::new(),
        }
    }

    /// A two-target gate (SWAP, iSWAP, Peres) with optional controls.
    pub fn two_target(
        nqubits: u32,
        op: OpType,
        controls: Vec<Control>,
        target0: QubitId,
        target1: QubitId,
    ) -> Self {
        Self {
            nqubits,
            op,
            controls,
            targets: SmallVec::from_slice(&[target0, target1]),
            params: SmallVec::new(),
        }
    }

    /// Attach real parameters.
    #[must_use]
    pub fn with_params(mut self, params: &[f64]) -> Self {
        self.params = SmallVec::from_slice(params);
        self
    }
}

/// An ordered list of operations treated as one, used for macro
/// expansion and register broadcasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundOperation {
    /// Width of the circuit this operation belongs to.
    pub nqubits: u32,
    /// The children, applied left to right.
    pub ops: Vec<Operation>,
}

impl CompoundOperation {
    /// An empty compound of the given width.
    pub fn new(nqubits: u32) -> Self {
        Self {
            nqubits,
            ops: vec![],
        }
    }

    /// Append a child operation.
    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the compound has no children.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// The non-unitary kinds: measure, reset, barrier, snapshot, and the
/// probability display marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonUnitaryOperation {
    /// Width of the circuit this operation belongs to.
    pub nqubits: u32,
    /// One of the non-unitary [`OpType`] kinds.
    pub kind: OpType,
    /// Qubits acted on.
    pub qubits: Vec<QubitId>,
    /// Classical destinations, parallel to `qubits` (measurements only).
    pub classics: Vec<ClbitId>,
    /// Snapshot argument.
    pub arg: Option<u64>,
}

impl NonUnitaryOperation {
    /// A measurement aligning `qubits[i]` with `classics[i]`.
    pub fn measure(
        nqubits: u32,
        qubits: Vec<QubitId>,
        classics: Vec<ClbitId>,
    ) -> crate::error::IrResult<Self> {
        if qubits.len() != classics.len() {
            return Err(crate::error::IrError::MeasurementMismatch {
                qubits: qubits.len(),
                classics: classics.len(),
            });
        }
        Ok(Self {
            nqubits,
            kind: OpType::Measure,
            qubits,
            classics,
            arg: None,
        })
    }

    /// A reset of the given qubits.
    pub fn reset(nqubits: u32, qubits: Vec<QubitId>) -> Self {
        Self {
            nqubits,
            kind: OpType::Reset,
            qubits,
            classics: vec![],
            arg: None,
        }
    }

    /// A barrier over the given qubits.
    pub fn barrier(nqubits: u32, qubits: Vec<QubitId>) -> Self {
        Self {
            nqubits,
            kind: OpType::Barrier,
            qubits,
            classics: vec![],
            arg: None,
        }
    }

    /// A snapshot with identifier `n` over the given qubits.
    pub fn snapshot(nqubits: u32, qubits: Vec<QubitId>, n: u64) -> Self {
        Self {
            nqubits,
            kind: OpType::Snapshot,
            qubits,
            classics: vec![],
            arg: Some(n),
        }
    }

    /// The probability display marker.
    pub fn show_probabilities(nqubits: u32) -> Self {
        Self {
            nqubits,
            kind: OpType::ShowProbabilities,
            qubits: vec![],
            classics: vec![],
            arg: None,
        }
    }
}

/// A `Standard` or `Compound` operation guarded by a classical register
/// slice comparing equal to an expected integer. Runtime semantics are the
/// responsibility of the consuming engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicControlledOperation {
    /// The wrapped operation.
    pub op: Box<Operation>,
    /// Start of the guarding classical run.
    pub creg_start: ClbitId,
    /// Length of the guarding classical run.
    pub creg_size: u32,
    /// The value the run must hold for the operation to fire.
    pub expected: u64,
}

/// A circuit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A parameterised unitary.
    Standard(StandardOperation),
    /// An ordered group treated as one operation.
    Compound(CompoundOperation),
    /// Measure / reset / barrier / snapshot / probability marker.
    NonUnitary(NonUnitaryOperation),
    /// A classically guarded operation.
    ClassicControlled(ClassicControlledOperation),
}

impl Operation {
    /// Whether the operation acts on the given physical qubit.
    pub fn acts_on(&self, qubit: QubitId) -> bool {
        match self {
            Operation::Standard(op) => {
                op.targets.contains(&qubit) || op.controls.iter().any(|c| c.qubit == qubit)
            }
            Operation::Compound(op) => op.ops.iter().any(|child| child.acts_on(qubit)),
            Operation::NonUnitary(op) => op.qubits.contains(&qubit),
            Operation::ClassicControlled(op) => op.op.acts_on(qubit),
        }
    }

    /// Update the stored circuit width, recursively.
    pub fn set_nqubits(&mut self, nqubits: u32) {
        match self {
            Operation::Standard(op) => op.nqubits = nqubits,
            Operation::Compound(op) => {
                op.nqubits = nqubits;
                for child in &mut op.ops {
                    child.set_nqubits(nqubits);
                }
            }
            Operation::NonUnitary(op) => op.nqubits = nqubits,
            Operation::ClassicControlled(op) => op.op.set_nqubits(nqubits),
        }
    }

    /// The stored circuit width.
    pub fn num_qubits(&self) -> u32 {
        match self {
            Operation::Standard(op) => op.nqubits,
            Operation::Compound(op) => op.nqubits,
            Operation::NonUnitary(op) => op.nqubits,
            Operation::ClassicControlled(op) => op.op.num_qubits(),
        }
    }

    /// Whether the operation is unitary. Compounds are unitary iff every
    /// child is; guarded operations are not.
    pub fn is_unitary(&self) -> bool {
        match self {
            Operation::Standard(op) => op.op.is_unitary(),
            Operation::Compound(op) => op.ops.iter().all(Operation::is_unitary),
            Operation::NonUnitary(_) | Operation::ClassicControlled(_) => false,
        }
    }

    /// The qubits the operation targets (acted-on qubits for non-unitary
    /// kinds; the union over children for compounds).
    pub fn targets(&self) -> Vec<QubitId> {
        match self {
            Operation::Standard(op) => op.targets.to_vec(),
            Operation::Compound(op) => op.ops.iter().flat_map(Operation::targets).collect(),
            Operation::NonUnitary(op) => op.qubits.clone(),
            Operation::ClassicControlled(op) => op.op.targets(),
        }
    }

    /// Count of elementary gates, summing over compound children.
    pub fn num_individual_ops(&self) -> usize {
        match self {
            Operation::Compound(op) => op.ops.iter().map(Operation::num_individual_ops).sum(),
            _ => 1,
        }
    }

    /// Printable name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Standard(op) => op.op.name(),
            Operation::Compound(_) => "compound",
            Operation::NonUnitary(op) => op.kind.name(),
            Operation::ClassicControlled(_) => "if",
        }
    }

    /// Render a single row of the circuit table: one column per logical
    /// qubit position resolved through `layout`.
    pub fn format_row(&self, layout: &Permutation, total: u32) -> String {
        let mut cols: Vec<String> = (0..total).map(|_| "|".to_string()).collect();
        let col = |q: QubitId| {
            layout
                .get(&q)
                .map(|l| l.0 as usize)
                .filter(|i| *i < total as usize)
        };

        let mut label = String::new();
        match self {
            Operation::Standard(op) => {
                let _ = write!(label, "{:<8}", op.op.name());
                for c in &op.controls {
                    if let Some(i) = col(c.qubit) {
                        cols[i] = match c.polarity {
                            Polarity::Pos => "c".into(),
                            Polarity::Neg => "n".into(),
                        };
                    }
                }
                for t in &op.targets {
                    if let Some(i) = col(*t) {
                        cols[i] = op.op.name().into();
                    }
                }
            }
            Operation::Compound(op) => {
                let _ = write!(label, "{:<8}", format!("[{}]", op.len()));
                for q in self.targets() {
                    if let Some(i) = col(q) {
                        cols[i] = "*".into();
                    }
                }
            }
            Operation::NonUnitary(op) => {
                let _ = write!(label, "{:<8}", op.kind.name());
                match op.kind {
                    OpType::Measure => {
                        for (q, c) in op.qubits.iter().zip(op.classics.iter()) {
                            if let Some(i) = col(*q) {
                                cols[i] = format!("{}", c.0);
                            }
                        }
                    }
                    OpType::ShowProbabilities => {}
                    _ => {
                        let mark = match op.kind {
                            OpType::Reset => "r",
                            OpType::Snapshot => "s",
                            _ => "b",
                        };
                        for q in &op.qubits {
                            if let Some(i) = col(*q) {
                                cols[i] = mark.into();
                            }
                        }
                    }
                }
            }
            Operation::ClassicControlled(op) => {
                let _ = write!(
                    label,
                    "if(c[{}..{}]=={}) ",
                    op.creg_start.0,
                    op.creg_start.0 + op.creg_size,
                    op.expected
                );
                return format!("{label}{}", op.op.format_row(layout, total));
            }
        }
        format!("{label}\t{}", cols.join("\t"))
    }
}

impl From<StandardOperation> for Operation {
    fn from(op: StandardOperation) -> Self {
        Operation::Standard(op)
    }
}

impl From<CompoundOperation> for Operation {
    fn from(op: CompoundOperation) -> Self {
        Operation::Compound(op)
    }
}

impl From<NonUnitaryOperation> for Operation {
    fn from(op: NonUnitaryOperation) -> Self {
        Operation::NonUnitary(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acts_on() {
        let op: Operation = StandardOperation::controlled(
            3,
            OpType::X,
            vec![Control::pos(QubitId(0))],
            QubitId(2),
        )
        .into();

        assert!(op.acts_on(QubitId(0)));
        assert!(!op.acts_on(QubitId(1)));
        assert!(op.acts_on(QubitId(2)));
    }

    #[test]
    fn test_compound_forwards() {
        let mut compound = CompoundOperation::new(2);
        compound.push(StandardOperation::new(2, OpType::H, QubitId(0)).into());
        compound.push(StandardOperation::new(2, OpType::X, QubitId(1)).into());
        let op: Operation = compound.into();

        assert!(op.acts_on(QubitId(0)));
        assert!(op.acts_on(QubitId(1)));
        assert!(op.is_unitary());
        assert_eq!(op.num_individual_ops(), 2);
    }

    #[test]
    fn test_measure_pairing() {
        let m = NonUnitaryOperation::measure(
            2,
            vec![QubitId(0), QubitId(1)],
            vec![ClbitId(0), ClbitId(1)],
        )
        .unwrap();
        let op: Operation = m.into();
        assert!(!op.is_unitary());
        assert!(op.acts_on(QubitId(1)));
        assert_eq!(op.targets(), vec![QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_measure_mismatch() {
        let err = NonUnitaryOperation::measure(2, vec![QubitId(0)], vec![]);
        assert!(err.is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let op: Operation = StandardOperation::controlled(
            2,
            OpType::Rz,
            vec![Control::neg(QubitId(0))],
            QubitId(1),
        )
        .with_params(&[0.5])
        .into();

        let json = serde_json::to_string(&op).unwrap();
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }

    #[test]
    fn test_set_nqubits_recurses() {
        let mut compound = CompoundOperation::new(2);
        compound.push(StandardOperation::new(2, OpType::H, QubitId(0)).into());
        let mut op: Operation = compound.into();
        op.set_nqubits(5);
        assert_eq!(op.num_qubits(), 5);
        if let Operation::Compound(c) = &op {
            assert_eq!(c.ops[0].num_qubits(), 5);
        }
    }
}
