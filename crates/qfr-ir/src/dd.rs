//! The narrow interface the IR requires of a decision-diagram engine.
//!
//! The engine itself is an external collaborator: it interns node state,
//! reference-counts, and garbage-collects on its own. The IR only populates
//! a per-line status array indexed by variable, asks the engine to build an
//! edge, and resets the array afterwards. Edges are opaque here.

use crate::error::{IrError, IrResult};
use crate::operation::{Operation, Polarity, StandardOperation};
use crate::qubit::Permutation;
use crate::OpType;

/// Compile-time upper bound on the total qubit count.
pub const MAX_QUBITS: usize = 128;

/// Per-variable role of a gate application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStatus {
    /// Not involved.
    #[default]
    Default,
    /// A target variable.
    Target,
    /// A positive control variable.
    PosControl,
    /// A negative control variable.
    NegControl,
}

/// The line array handed to the engine when building a gate edge.
pub type Line = [LineStatus; MAX_QUBITS];

/// Strategy handle for dynamic variable reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderStrategy {
    /// Keep the current variable order.
    #[default]
    None,
    /// Sifting-based reordering.
    Sifting,
}

/// Minimum surface of the external decision-diagram engine.
pub trait DdPackage {
    /// Opaque edge handle.
    type Edge: Clone;

    /// The identity over `nqubits` variables.
    fn identity(&mut self, nqubits: u32) -> Self::Edge;

    /// Build a gate edge for `op` with the given parameters; involved
    /// variables are flagged in `line`.
    fn build_gate(&mut self, op: OpType, params: &[f64], line: &Line) -> Self::Edge;

    /// Matrix (or matrix-vector) product.
    fn multiply(&mut self, lhs: &Self::Edge, rhs: &Self::Edge) -> Self::Edge;

    /// Increase the reference count of an edge.
    fn inc_ref(&mut self, edge: &Self::Edge);

    /// Decrease the reference count of an edge.
    fn dec_ref(&mut self, edge: &Self::Edge);

    /// Collect unreferenced nodes.
    fn garbage_collect(&mut self);

    /// Rebuild `edge` under a new variable order, updating `var_map` in
    /// lockstep.
    fn dynamic_reorder(
        &mut self,
        edge: Self::Edge,
        var_map: &mut Permutation,
        strategy: ReorderStrategy,
    ) -> Self::Edge;
}

impl StandardOperation {
    /// Flag this operation's controls and targets in `line`, resolving
    /// physical indices through `map`.
    pub fn set_line(&self, line: &mut Line, map: &Permutation) {
        for c in &self.controls {
            if let Some(v) = map.get(&c.qubit) {
                line[v.0 as usize] = match c.polarity {
                    Polarity::Pos => LineStatus::PosControl,
                    Polarity::Neg => LineStatus::NegControl,
                };
            }
        }
        for t in &self.targets {
            if let Some(v) = map.get(t) {
                line[v.0 as usize] = LineStatus::Target;
            }
        }
    }

    /// Reset the entries flagged by [`set_line`](Self::set_line).
    pub fn reset_line(&self, line: &mut Line, map: &Permutation) {
        for c in &self.controls {
            if let Some(v) = map.get(&c.qubit) {
                line[v.0 as usize] = LineStatus::Default;
            }
        }
        for t in &self.targets {
            if let Some(v) = map.get(t) {
                line[v.0 as usize] = LineStatus::Default;
            }
        }
    }
}

impl Operation {
    /// Build the decision-diagram edge for this operation. Compounds
    /// compose children left to right as a matrix product. Non-unitary and
    /// guarded operations have no diagram.
    pub fn build_dd<P: DdPackage>(
        &self,
        dd: &mut P,
        line: &mut Line,
        map: &Permutation,
    ) -> IrResult<P::Edge> {
        match self {
            Operation::Standard(op) => {
                op.set_line(line, map);
                let edge = dd.build_gate(op.op, &op.params, line);
                op.reset_line(line, map);
                Ok(edge)
            }
            Operation::Compound(op) => {
                let mut children = op.ops.iter();
                let first = children
                    .next()
                    .ok_or_else(|| IrError::NonUnitary("empty compound".into()))?;
                let mut edge = first.build_dd(dd, line, map)?;
                for child in children {
                    let next = child.build_dd(dd, line, map)?;
                    edge = dd.multiply(&next, &edge);
                }
                Ok(edge)
            }
            Operation::NonUnitary(_) | Operation::ClassicControlled(_) => {
                Err(IrError::NonUnitary(self.name().into()))
            }
        }
    }

    /// Variable-reordered variant of [`build_dd`](Self::build_dd): physical
    /// indices are resolved through `map` and then through the engine's
    /// variable permutation `var_map`.
    pub fn build_dd_reordered<P: DdPackage>(
        &self,
        dd: &mut P,
        line: &mut Line,
        map: &Permutation,
        var_map: &Permutation,
    ) -> IrResult<P::Edge> {
        // compose map with var_map, then reuse the plain path
        let composed: Permutation = map
            .iter()
            .filter_map(|(phys, logical)| var_map.get(logical).map(|v| (*phys, *v)))
            .collect();
        self.build_dd(dd, line, &composed)
    }
}

/// The identity variable permutation over `n` variables.
pub fn standard_permutation(n: u32) -> Permutation {
    (0..n).map(|i| (i.into(), i.into())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Control;
    use crate::qubit::QubitId;

    /// A tracing stand-in for the external engine: edges record the
    /// operations applied.
    #[derive(Default)]
    struct TraceDd;

    impl DdPackage for TraceDd {
        type Edge = Vec<String>;

        fn identity(&mut self, _nqubits: u32) -> Self::Edge {
            vec!["id".into()]
        }

        fn build_gate(&mut self, op: OpType, _params: &[f64], line: &Line) -> Self::Edge {
            let involved = line
                .iter()
                .enumerate()
                .filter(|(_, s)| **s != LineStatus::Default)
                .map(|(i, s)| format!("{i}:{s:?}"))
                .collect::<Vec<_>>()
                .join(",");
            vec![format!("{}({involved})", op.name())]
        }

        fn multiply(&mut self, lhs: &Self::Edge, rhs: &Self::Edge) -> Self::Edge {
            let mut out = rhs.clone();
            out.extend(lhs.iter().cloned());
            out
        }

        fn inc_ref(&mut self, _edge: &Self::Edge) {}
        fn dec_ref(&mut self, _edge: &Self::Edge) {}
        fn garbage_collect(&mut self) {}

        fn dynamic_reorder(
            &mut self,
            edge: Self::Edge,
            _var_map: &mut Permutation,
            _strategy: ReorderStrategy,
        ) -> Self::Edge {
            edge
        }
    }

    #[test]
    fn test_line_population() {
        let op = StandardOperation::controlled(
            2,
            OpType::X,
            vec![Control::pos(QubitId(0))],
            QubitId(1),
        );
        let map = standard_permutation(2);
        let mut line: Line = [LineStatus::Default; MAX_QUBITS];

        op.set_line(&mut line, &map);
        assert_eq!(line[0], LineStatus::PosControl);
        assert_eq!(line[1], LineStatus::Target);

        op.reset_line(&mut line, &map);
        assert!(line.iter().all(|s| *s == LineStatus::Default));
    }

    #[test]
    fn test_compound_composes_left_to_right() {
        let mut compound = crate::operation::CompoundOperation::new(1);
        compound.push(StandardOperation::new(1, OpType::H, QubitId(0)).into());
        compound.push(StandardOperation::new(1, OpType::X, QubitId(0)).into());
        let op: Operation = compound.into();

        let mut dd = TraceDd;
        let map = standard_permutation(1);
        let mut line: Line = [LineStatus::Default; MAX_QUBITS];
        let edge = op.build_dd(&mut dd, &mut line, &map).unwrap();

        // first child applied first
        assert!(edge[0].starts_with('h'));
        assert!(edge[1].starts_with('x'));
    }

    #[test]
    fn test_non_unitary_rejected() {
        let op: Operation = crate::operation::NonUnitaryOperation::reset(1, vec![QubitId(0)]).into();
        let mut dd = TraceDd;
        let map = standard_permutation(1);
        let mut line: Line = [LineStatus::Default; MAX_QUBITS];
        assert!(op.build_dd(&mut dd, &mut line, &map).is_err());
    }
}
