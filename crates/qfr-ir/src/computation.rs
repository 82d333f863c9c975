//! The circuit container: an ordered operation sequence over a split
//! address space of data qubits, ancillary qubits and classical bits,
//! together with the two layout permutations and the ancillary/garbage
//! sets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bitset::Bitset;
use crate::dd::{standard_permutation, DdPackage, Line, LineStatus, ReorderStrategy, MAX_QUBITS};
use crate::error::{IrError, IrResult};
use crate::operation::{Operation, OpType, StandardOperation};
use crate::qubit::{ClbitId, Permutation, QubitId};
use crate::register::{consolidate, locate, Register, RegisterMap, DEFAULT_ANCREG, DEFAULT_QREG};

/// Per-circuit statistics as printed by the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    /// Number of data qubits.
    pub nqubits: u32,
    /// Number of ancillary qubits.
    pub nancillae: u32,
    /// Number of operations in the sequence.
    pub nops: usize,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "n: {}", self.nqubits)?;
        writeln!(f, "anc: {}", self.nancillae)?;
        write!(f, "m: {}", self.nops)
    }
}

/// A quantum computation: the single owner of one operation sequence and
/// its register, layout and bitset state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuantumComputation {
    name: String,
    nqubits: u32,
    nancillae: u32,
    nclassics: u32,
    qregs: RegisterMap,
    cregs: RegisterMap,
    ancregs: RegisterMap,
    initial_layout: Permutation,
    output_permutation: Permutation,
    ancillary: Bitset,
    garbage: Bitset,
    ops: Vec<Operation>,
}

impl QuantumComputation {
    /// Create an empty computation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of data qubits.
    pub fn num_qubits(&self) -> u32 {
        self.nqubits
    }

    /// Number of ancillary qubits.
    pub fn num_ancillae(&self) -> u32 {
        self.nancillae
    }

    /// Number of classical bits.
    pub fn num_classics(&self) -> u32 {
        self.nclassics
    }

    /// Width of the whole address space (data plus ancillary).
    pub fn total_qubits(&self) -> u32 {
        self.nqubits + self.nancillae
    }

    /// Number of operations in the sequence.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Number of elementary gates, resolving compounds.
    pub fn num_individual_ops(&self) -> usize {
        self.ops.iter().map(Operation::num_individual_ops).sum()
    }

    /// The operation sequence.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// The quantum register map.
    pub fn quantum_registers(&self) -> &RegisterMap {
        &self.qregs
    }

    /// The classical register map.
    pub fn classical_registers(&self) -> &RegisterMap {
        &self.cregs
    }

    /// The ancillary register map.
    pub fn ancillary_registers(&self) -> &RegisterMap {
        &self.ancregs
    }

    /// Look up a quantum register by name.
    pub fn quantum_register(&self, name: &str) -> Option<Register> {
        self.qregs.get(name).copied()
    }

    /// Look up a classical register by name.
    pub fn classical_register(&self, name: &str) -> Option<Register> {
        self.cregs.get(name).copied()
    }

    /// The initial layout (physical to logical).
    pub fn initial_layout(&self) -> &Permutation {
        &self.initial_layout
    }

    /// Mutable access to the initial layout, for front-ends that scrape
    /// layout information from the input.
    pub fn initial_layout_mut(&mut self) -> &mut Permutation {
        &mut self.initial_layout
    }

    /// The output permutation (physical to logical).
    pub fn output_permutation(&self) -> &Permutation {
        &self.output_permutation
    }

    /// Mutable access to the output permutation.
    pub fn output_permutation_mut(&mut self) -> &mut Permutation {
        &mut self.output_permutation
    }

    /// Whether the logical qubit is marked ancillary.
    pub fn is_ancillary(&self, logical: QubitId) -> bool {
        self.ancillary.test(logical.0)
    }

    /// Whether the logical qubit is marked garbage.
    pub fn is_garbage(&self, logical: QubitId) -> bool {
        self.garbage.test(logical.0)
    }

    /// Mark a logical qubit as garbage (its output is not observed).
    pub fn set_garbage(&mut self, logical: QubitId) {
        self.garbage.set(logical.0);
    }

    /// Whether the physical index lies in an ancillary register.
    pub fn physical_qubit_is_ancillary(&self, phys: QubitId) -> bool {
        locate(&self.ancregs, phys.0).is_some()
    }

    /// Circuit statistics (n / anc / m).
    pub fn statistics(&self) -> Statistics {
        Statistics {
            nqubits: self.nqubits,
            nancillae: self.nancillae,
            nops: self.ops.len(),
        }
    }

    /// The largest logical index in the image of a layout permutation.
    pub fn highest_logical_qubit_index(map: &Permutation) -> Option<QubitId> {
        map.values().max().copied()
    }

    // =========================================================================
    // Sequence mutation
    // =========================================================================

    /// Append an operation, stamping it with the current width.
    pub fn push(&mut self, op: impl Into<Operation>) {
        let mut op = op.into();
        op.set_nqubits(self.total_qubits());
        self.ops.push(op);
    }

    /// Return the computation to its empty state, keeping the name.
    pub fn reset(&mut self) {
        let name = std::mem::take(&mut self.name);
        *self = Self::new(name);
    }

    // =========================================================================
    // Register mutation
    // =========================================================================

    fn check_capacity(&self, additional: u32) -> IrResult<()> {
        let requested = self.total_qubits() + additional;
        if requested as usize > MAX_QUBITS {
            return Err(IrError::CapacityExceeded {
                requested,
                max: MAX_QUBITS as u32,
            });
        }
        Ok(())
    }

    fn update_op_widths(&mut self) {
        let total = self.total_qubits();
        for op in &mut self.ops {
            op.set_nqubits(total);
        }
    }

    /// Append `n` data qubits as register `name`. An existing register of
    /// the same name is extended iff it ends at the current tail.
    pub fn add_qubit_register(&mut self, n: u32, name: &str) -> IrResult<()> {
        self.check_capacity(n)?;
        let total = self.total_qubits();

        if let Some(reg) = self.qregs.get_mut(name) {
            if reg.end() != total {
                return Err(IrError::RegisterExtensionIllegal(name.into()));
            }
            reg.size += n;
        } else {
            self.qregs.insert(name.into(), Register::new(total, n));
        }

        for i in 0..n {
            let j = QubitId(total + i);
            self.initial_layout.insert(j, j);
            self.output_permutation.insert(j, j);
        }
        self.nqubits += n;
        self.update_op_widths();
        Ok(())
    }

    /// Append `n` classical bits as register `name`. Classical registers
    /// are never extended.
    pub fn add_classical_register(&mut self, n: u32, name: &str) -> IrResult<()> {
        if self.cregs.contains_key(name) {
            return Err(IrError::RegisterAlreadyExists(name.into()));
        }
        self.cregs.insert(name.into(), Register::new(self.nclassics, n));
        self.nclassics += n;
        Ok(())
    }

    /// Append `n` ancillary qubits as register `name`, after all current
    /// qubits and ancillae. The new logical indices are marked ancillary.
    pub fn add_ancillary_register(&mut self, n: u32, name: &str) -> IrResult<()> {
        self.check_capacity(n)?;
        let total = self.total_qubits();

        if let Some(reg) = self.ancregs.get_mut(name) {
            if reg.end() != total {
                return Err(IrError::RegisterExtensionIllegal(name.into()));
            }
            reg.size += n;
        } else {
            self.ancregs.insert(name.into(), Register::new(total, n));
        }

        for i in 0..n {
            let j = QubitId(total + i);
            self.initial_layout.insert(j, j);
            self.output_permutation.insert(j, j);
            self.ancillary.set(j.0);
        }
        self.nancillae += n;
        self.update_op_widths();
        Ok(())
    }

    /// Insert a single scratch qubit at the given physical index, fusing
    /// into an adjacent ancillary run where possible.
    pub fn add_ancillary_qubit(
        &mut self,
        phys: QubitId,
        output: Option<QubitId>,
    ) -> IrResult<()> {
        if self.initial_layout.contains_key(&phys) || self.output_permutation.contains_key(&phys) {
            return Err(IrError::QubitAlreadyAssigned(phys.0));
        }
        self.check_capacity(1)?;

        let mut fused = false;
        for reg in self.ancregs.values_mut() {
            if reg.start == phys.0 + 1 {
                reg.start -= 1;
                reg.size += 1;
                fused = true;
                break;
            }
            if reg.end() == phys.0 {
                reg.size += 1;
                fused = true;
                break;
            }
        }
        if self.ancregs.is_empty() {
            self.ancregs
                .insert(DEFAULT_ANCREG.into(), Register::new(phys.0, 1));
        } else if !fused {
            self.ancregs
                .insert(format!("{DEFAULT_ANCREG}_{}", phys.0), Register::new(phys.0, 1));
        }

        let logical = QubitId(self.total_qubits());
        self.nancillae += 1;
        self.ancillary.set(logical.0);
        self.initial_layout.insert(phys, logical);
        if let Some(out) = output {
            self.output_permutation.insert(phys, out);
        }
        self.update_op_widths();
        Ok(())
    }

    /// Insert a single data qubit at the given physical index. Inserting at
    /// the data/ancilla boundary shifts the ancillary runs upward.
    pub fn add_qubit(
        &mut self,
        logical: QubitId,
        phys: QubitId,
        output: Option<QubitId>,
    ) -> IrResult<()> {
        if self.initial_layout.contains_key(&phys) || self.output_permutation.contains_key(&phys) {
            return Err(IrError::QubitAlreadyAssigned(phys.0));
        }
        if logical.0 > self.nqubits {
            return Err(IrError::LogicalIndexOutOfRange {
                index: logical.0,
                count: self.nqubits,
            });
        }
        self.check_capacity(1)?;

        let mut fused = false;
        let mut shift_ancillae = false;
        for reg in self.qregs.values_mut() {
            if reg.start == phys.0 + 1 {
                reg.start -= 1;
                reg.size += 1;
                fused = true;
                break;
            }
            if reg.end() == phys.0 {
                if phys.0 == self.nqubits {
                    shift_ancillae = true;
                }
                reg.size += 1;
                fused = true;
                break;
            }
        }
        if shift_ancillae {
            for reg in self.ancregs.values_mut() {
                reg.start += 1;
            }
        }

        consolidate(&mut self.qregs);

        if self.qregs.is_empty() {
            self.qregs
                .insert(DEFAULT_QREG.into(), Register::new(phys.0, 1));
        } else if !fused {
            self.qregs
                .insert(format!("{DEFAULT_QREG}_{}", phys.0), Register::new(phys.0, 1));
        }

        self.nqubits += 1;
        self.initial_layout.insert(phys, logical);
        if let Some(out) = output {
            self.output_permutation.insert(phys, out);
        }
        self.update_op_widths();

        self.ancillary.make_room(logical.0);
        self.garbage.make_room(logical.0);
        Ok(())
    }

    /// Remove the given logical qubit, returning the physical index it was
    /// assigned to and its former output index, if any.
    ///
    /// Removing an inner qubit of a register splits it into `_l`/`_h`
    /// halves; removing a boundary qubit shrinks the run; the last qubit of
    /// a register deletes it.
    pub fn remove_qubit(&mut self, logical: QubitId) -> IrResult<(QubitId, Option<QubitId>)> {
        let phys = self
            .initial_layout
            .iter()
            .find(|(_, l)| **l == logical)
            .map(|(p, _)| *p)
            .ok_or(IrError::UnknownLogicalQubit(logical.0))?;
        tracing::debug!(logical = logical.0, physical = phys.0, "removing qubit");

        let is_ancillary = self.physical_qubit_is_ancillary(phys);
        let map = if is_ancillary {
            &mut self.ancregs
        } else {
            &mut self.qregs
        };

        let (reg_name, offset) = locate(map, phys.0)
            .map(|(n, o)| (n.to_string(), o))
            .ok_or(IrError::UnknownRegister {
                kind: "quantum",
                index: phys.0,
            })?;
        let reg = map[&reg_name];

        if offset == 0 {
            if reg.size == 1 {
                map.remove(&reg_name);
            } else {
                let r = map.get_mut(&reg_name).expect("register present");
                r.start += 1;
                r.size -= 1;
            }
        } else if offset == reg.size - 1 {
            map.get_mut(&reg_name).expect("register present").size -= 1;
        } else {
            map.remove(&reg_name);
            map.insert(format!("{reg_name}_l"), Register::new(reg.start, offset));
            map.insert(
                format!("{reg_name}_h"),
                Register::new(reg.start + offset + 1, reg.size - offset - 1),
            );
        }

        if is_ancillary {
            self.nancillae -= 1;
        } else {
            self.nqubits -= 1;
        }

        self.initial_layout.remove(&phys);
        let former_output = self.output_permutation.remove(&phys);

        self.update_op_widths();
        self.ancillary.collapse(logical.0);
        self.garbage.collapse(logical.0);

        Ok((phys, former_output))
    }

    /// Fuse fragmented `_l`/`_h` register pairs back together in both the
    /// data and ancillary maps.
    pub fn consolidate_registers(&mut self) {
        consolidate(&mut self.qregs);
        consolidate(&mut self.ancregs);
    }

    /// Whether no operation in the sequence acts on the physical qubit.
    pub fn is_idle_qubit(&self, phys: QubitId) -> bool {
        !self.ops.iter().any(|op| op.acts_on(phys))
    }

    /// Remove idle qubits. Unless `force` is set, idle qubits that still
    /// appear in the output permutation are retained.
    pub fn strip_idle_qubits(&mut self, force: bool) -> IrResult<()> {
        let snapshot: Vec<QubitId> = self.initial_layout.keys().copied().collect();
        for phys in snapshot.into_iter().rev() {
            if !self.is_idle_qubit(phys) {
                continue;
            }
            if !force && self.output_permutation.contains_key(&phys) {
                continue;
            }
            let Some(logical) = self.initial_layout.get(&phys).copied() else {
                continue;
            };
            tracing::debug!(physical = phys.0, logical = logical.0, "stripping idle qubit");
            self.remove_qubit(logical)?;

            // removing an inner qubit leaves a hole in the logical range;
            // close it in both permutations
            if logical.0 < self.total_qubits() {
                for l in self.initial_layout.values_mut() {
                    if *l > logical {
                        l.0 -= 1;
                    }
                }
                for l in self.output_permutation.values_mut() {
                    if *l > logical {
                        l.0 -= 1;
                    }
                }
            }
        }
        self.update_op_widths();
        Ok(())
    }

    // =========================================================================
    // Register lookup
    // =========================================================================

    /// Name and in-register offset of a physical qubit, searching the data
    /// registers first and the ancillary registers second.
    pub fn qubit_register_of(&self, phys: QubitId) -> IrResult<(&str, u32)> {
        locate(&self.qregs, phys.0)
            .or_else(|| locate(&self.ancregs, phys.0))
            .ok_or(IrError::UnknownRegister {
                kind: "quantum",
                index: phys.0,
            })
    }

    /// Name and in-register offset of a classical bit.
    pub fn classical_register_of(&self, bit: ClbitId) -> IrResult<(&str, u32)> {
        locate(&self.cregs, bit.0).ok_or(IrError::UnknownRegister {
            kind: "classical",
            index: bit.0,
        })
    }

    // =========================================================================
    // Decision-diagram construction
    // =========================================================================

    /// Build the circuit functionality as a single edge by multiplying the
    /// per-operation diagrams in sequence order. The final permutation is
    /// corrected towards the output permutation with explicit swaps.
    pub fn build_functionality<P: DdPackage>(&self, dd: &mut P) -> IrResult<P::Edge> {
        let total = self.total_qubits();
        let mut line: Line = [LineStatus::Default; MAX_QUBITS];
        let mut map = self.initial_layout.clone();

        let mut edge = dd.identity(total);
        dd.inc_ref(&edge);

        for op in &self.ops {
            let gate = op.build_dd(dd, &mut line, &map)?;
            let product = dd.multiply(&gate, &edge);
            dd.inc_ref(&product);
            dd.dec_ref(&edge);
            edge = product;
            dd.garbage_collect();
        }

        change_permutation(
            &mut edge,
            &mut map,
            &self.output_permutation,
            &mut line,
            dd,
            total,
            None,
        )?;
        Ok(edge)
    }

    /// Apply the circuit to an input vector edge.
    pub fn simulate<P: DdPackage>(&self, input: P::Edge, dd: &mut P) -> IrResult<P::Edge> {
        let total = self.total_qubits();
        let mut line: Line = [LineStatus::Default; MAX_QUBITS];
        let mut map = self.initial_layout.clone();

        let mut edge = input;
        dd.inc_ref(&edge);

        for op in &self.ops {
            let gate = op.build_dd(dd, &mut line, &map)?;
            let product = dd.multiply(&gate, &edge);
            dd.inc_ref(&product);
            dd.dec_ref(&edge);
            edge = product;
            dd.garbage_collect();
        }

        change_permutation(
            &mut edge,
            &mut map,
            &self.output_permutation,
            &mut line,
            dd,
            total,
            None,
        )?;
        Ok(edge)
    }

    /// Variant of [`build_functionality`](Self::build_functionality) that
    /// lets the engine reorder variables after every application. Returns
    /// the final edge together with the variable permutation the engine
    /// ended up with. Every operation must be unitary.
    pub fn build_functionality_reordered<P: DdPackage>(
        &self,
        dd: &mut P,
        strategy: ReorderStrategy,
    ) -> IrResult<(P::Edge, Permutation)> {
        let total = self.total_qubits();
        let mut line: Line = [LineStatus::Default; MAX_QUBITS];
        let mut map = self.initial_layout.clone();
        let mut var_map = standard_permutation(total);

        let mut edge = dd.identity(total);
        dd.inc_ref(&edge);

        for op in &self.ops {
            if !op.is_unitary() {
                return Err(IrError::NonUnitary(op.name().into()));
            }
            let gate = op.build_dd_reordered(dd, &mut line, &map, &var_map)?;
            let product = dd.multiply(&gate, &edge);
            dd.inc_ref(&product);
            dd.dec_ref(&edge);
            edge = dd.dynamic_reorder(product, &mut var_map, strategy);
        }

        change_permutation(
            &mut edge,
            &mut map,
            &self.output_permutation,
            &mut line,
            dd,
            total,
            Some(&var_map),
        )?;
        edge = dd.dynamic_reorder(edge, &mut var_map, strategy);
        Ok((edge, var_map))
    }
}

/// Rewrite `from` into `to` by multiplying explicit SWAP diagrams onto
/// `edge`, one transposition at a time.
#[allow(clippy::too_many_arguments)]
fn change_permutation<P: DdPackage>(
    edge: &mut P::Edge,
    from: &mut Permutation,
    to: &Permutation,
    line: &mut Line,
    dd: &mut P,
    total: u32,
    var_map: Option<&Permutation>,
) -> IrResult<()> {
    for (&i, &goal) in to {
        let current = *from.get(&i).ok_or(IrError::UnknownLogicalQubit(goal.0))?;
        if current == goal {
            continue;
        }

        let j = from
            .iter()
            .find(|(_, v)| **v == goal)
            .map(|(k, _)| *k)
            .ok_or(IrError::UnknownLogicalQubit(goal.0))?;

        let swap = Operation::Standard(StandardOperation::two_target(
            total,
            OpType::Swap,
            vec![],
            i,
            j,
        ));
        let swap_dd = match var_map {
            Some(vm) => swap.build_dd_reordered(dd, line, from, vm)?,
            None => swap.build_dd(dd, line, from)?,
        };
        let product = dd.multiply(&swap_dd, edge);
        dd.inc_ref(&product);
        dd.dec_ref(edge);
        *edge = product;
        dd.garbage_collect();

        from.insert(i, goal);
        from.insert(j, current);
    }
    Ok(())
}

impl fmt::Display for QuantumComputation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i:\t")?;
        for logical in self.initial_layout.values() {
            write!(f, "{}\t", logical.0)?;
        }
        writeln!(f)?;

        let total = self.total_qubits();
        for (i, op) in self.ops.iter().enumerate() {
            writeln!(f, "{}:\t{}", i + 1, op.format_row(&self.initial_layout, total))?;
        }

        write!(f, "o:\t")?;
        for phys in self.initial_layout.keys() {
            match self.output_permutation.get(phys) {
                Some(logical) => write!(f, "{}\t", logical.0)?,
                None => write!(f, "|\t")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Control;

    fn ops_widths_consistent(qc: &QuantumComputation) -> bool {
        qc.ops().iter().all(|op| op.num_qubits() == qc.total_qubits())
    }

    fn layout_images_in_range(qc: &QuantumComputation) -> bool {
        let total = qc.total_qubits();
        qc.initial_layout().values().all(|l| l.0 < total)
            && qc.output_permutation().values().all(|l| l.0 < total)
    }

    #[test]
    fn test_add_qubit_register() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(3, "q").unwrap();

        assert_eq!(qc.num_qubits(), 3);
        assert_eq!(qc.quantum_register("q"), Some(Register::new(0, 3)));
        assert_eq!(qc.initial_layout().len(), 3);
        assert_eq!(qc.output_permutation().len(), 3);
    }

    #[test]
    fn test_extend_tail_register() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(2, "q").unwrap();
        qc.add_qubit_register(2, "q").unwrap();
        assert_eq!(qc.quantum_register("q"), Some(Register::new(0, 4)));

        qc.add_qubit_register(1, "r").unwrap();
        // "q" no longer ends at the tail
        assert!(matches!(
            qc.add_qubit_register(1, "q"),
            Err(IrError::RegisterExtensionIllegal(_))
        ));
    }

    #[test]
    fn test_classical_register_never_extends() {
        let mut qc = QuantumComputation::new("test");
        qc.add_classical_register(2, "c").unwrap();
        assert!(matches!(
            qc.add_classical_register(1, "c"),
            Err(IrError::RegisterAlreadyExists(_))
        ));
    }

    #[test]
    fn test_ancillary_register_marks_bits() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(2, "q").unwrap();
        qc.add_ancillary_register(2, "anc").unwrap();

        assert_eq!(qc.total_qubits(), 4);
        assert!(!qc.is_ancillary(QubitId(1)));
        assert!(qc.is_ancillary(QubitId(2)));
        assert!(qc.is_ancillary(QubitId(3)));
    }

    #[test]
    fn test_capacity_check() {
        let mut qc = QuantumComputation::new("test");
        assert!(matches!(
            qc.add_qubit_register(MAX_QUBITS as u32 + 1, "q"),
            Err(IrError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_remove_inner_qubit_splits_register() {
        // addQubitRegister(3, "q"); removeQubit(1) leaves q_l = {0, 1} and
        // q_h = {2, 1}; consolidation must not fuse them back
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(3, "q").unwrap();

        let (phys, out) = qc.remove_qubit(QubitId(1)).unwrap();
        assert_eq!(phys, QubitId(1));
        assert_eq!(out, Some(QubitId(1)));

        assert_eq!(qc.num_qubits(), 2);
        assert_eq!(qc.quantum_register("q_l"), Some(Register::new(0, 1)));
        assert_eq!(qc.quantum_register("q_h"), Some(Register::new(2, 1)));

        qc.consolidate_registers();
        assert_eq!(qc.quantum_register("q_l"), Some(Register::new(0, 1)));
        assert_eq!(qc.quantum_register("q_h"), Some(Register::new(2, 1)));
    }

    #[test]
    fn test_remove_boundary_qubits() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(3, "q").unwrap();

        qc.remove_qubit(QubitId(0)).unwrap();
        assert_eq!(qc.quantum_register("q"), Some(Register::new(1, 2)));

        qc.remove_qubit(QubitId(1)).unwrap();
        assert_eq!(qc.quantum_register("q"), Some(Register::new(1, 1)));

        qc.remove_qubit(QubitId(0)).unwrap();
        assert!(qc.quantum_register("q").is_none());
        assert_eq!(qc.num_qubits(), 0);
    }

    #[test]
    fn test_remove_updates_operation_widths() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(3, "q").unwrap();
        qc.push(StandardOperation::new(3, OpType::H, QubitId(0)));

        qc.remove_qubit(QubitId(2)).unwrap();
        assert!(ops_widths_consistent(&qc));
        assert!(layout_images_in_range(&qc));
    }

    #[test]
    fn test_remove_compacts_bitsets() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(1, "q").unwrap();
        qc.add_ancillary_register(2, "anc").unwrap();
        assert!(qc.is_ancillary(QubitId(1)));
        assert!(qc.is_ancillary(QubitId(2)));

        // dropping the data qubit shifts the ancillary marks down
        qc.remove_qubit(QubitId(0)).unwrap();
        assert!(qc.is_ancillary(QubitId(0)));
        assert!(qc.is_ancillary(QubitId(1)));
        assert!(!qc.is_ancillary(QubitId(2)));
    }

    #[test]
    fn test_add_ancillary_qubit_fuses() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(2, "q").unwrap();
        qc.add_ancillary_qubit(QubitId(2), None).unwrap();
        assert_eq!(
            qc.ancillary_registers().get(DEFAULT_ANCREG),
            Some(&Register::new(2, 1))
        );

        // adjacent: extends the existing run instead of creating a new one
        qc.add_ancillary_qubit(QubitId(3), None).unwrap();
        assert_eq!(
            qc.ancillary_registers().get(DEFAULT_ANCREG),
            Some(&Register::new(2, 2))
        );
        assert_eq!(qc.num_ancillae(), 2);
        assert!(qc.is_ancillary(QubitId(2)));
        assert!(qc.is_ancillary(QubitId(3)));
    }

    #[test]
    fn test_add_ancillary_qubit_rejects_assigned() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(2, "q").unwrap();
        assert!(matches!(
            qc.add_ancillary_qubit(QubitId(0), None),
            Err(IrError::QubitAlreadyAssigned(0))
        ));
    }

    #[test]
    fn test_add_qubit_backfills_hole() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(3, "q").unwrap();
        qc.remove_qubit(QubitId(1)).unwrap();

        // re-insert at the hole: q_l extends and consolidation fuses
        qc.add_qubit(QubitId(1), QubitId(1), None).unwrap();
        qc.consolidate_registers();
        assert_eq!(qc.quantum_register("q"), Some(Register::new(0, 3)));
        assert_eq!(qc.num_qubits(), 3);
    }

    #[test]
    fn test_is_idle_and_strip() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(3, "q").unwrap();
        qc.push(StandardOperation::controlled(
            3,
            OpType::X,
            vec![Control::pos(QubitId(0))],
            QubitId(2),
        ));

        assert!(!qc.is_idle_qubit(QubitId(0)));
        assert!(qc.is_idle_qubit(QubitId(1)));
        assert!(!qc.is_idle_qubit(QubitId(2)));

        // q1 is still in the output permutation, so it survives a soft strip
        qc.strip_idle_qubits(false).unwrap();
        assert_eq!(qc.num_qubits(), 3);

        qc.strip_idle_qubits(true).unwrap();
        assert_eq!(qc.num_qubits(), 2);
        assert!(ops_widths_consistent(&qc));
        assert!(layout_images_in_range(&qc));
    }

    #[test]
    fn test_strip_withheld_output() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(2, "q").unwrap();
        qc.push(StandardOperation::new(2, OpType::H, QubitId(0)));
        // q1 idle and not observed
        qc.output_permutation_mut().remove(&QubitId(1));

        qc.strip_idle_qubits(false).unwrap();
        assert_eq!(qc.num_qubits(), 1);
    }

    #[test]
    fn test_statistics() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(2, "q").unwrap();
        qc.add_ancillary_register(1, "anc").unwrap();
        qc.push(StandardOperation::new(3, OpType::H, QubitId(0)));

        let stats = qc.statistics();
        assert_eq!(stats.nqubits, 2);
        assert_eq!(stats.nancillae, 1);
        assert_eq!(stats.nops, 1);
        assert_eq!(format!("{stats}"), "n: 2\nanc: 1\nm: 1");
    }

    #[test]
    fn test_reset() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(2, "q").unwrap();
        qc.push(StandardOperation::new(2, OpType::H, QubitId(0)));
        qc.reset();

        assert_eq!(qc.name(), "test");
        assert_eq!(qc.num_qubits(), 0);
        assert_eq!(qc.num_ops(), 0);
        assert!(qc.initial_layout().is_empty());
    }

    #[test]
    fn test_register_lookup() {
        let mut qc = QuantumComputation::new("test");
        qc.add_qubit_register(2, "q").unwrap();
        qc.add_ancillary_register(1, "anc").unwrap();
        qc.add_classical_register(2, "c").unwrap();

        assert_eq!(qc.qubit_register_of(QubitId(1)).unwrap(), ("q", 1));
        assert_eq!(qc.qubit_register_of(QubitId(2)).unwrap(), ("anc", 0));
        assert!(qc.qubit_register_of(QubitId(5)).is_err());
        assert_eq!(qc.classical_register_of(ClbitId(0)).unwrap(), ("c", 0));
    }

    #[test]
    fn test_highest_logical_index() {
        let mut map = Permutation::new();
        assert_eq!(QuantumComputation::highest_logical_qubit_index(&map), None);
        map.insert(QubitId(0), QubitId(4));
        map.insert(QubitId(1), QubitId(2));
        assert_eq!(
            QuantumComputation::highest_logical_qubit_index(&map),
            Some(QubitId(4))
        );
    }
}
