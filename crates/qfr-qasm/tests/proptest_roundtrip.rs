//! Property-based round-trip tests for the OpenQASM parser/emitter pair.
//!
//! Random circuits are built programmatically, emitted, and re-parsed; the
//! flattened operation sequences must match exactly.

use proptest::prelude::*;

use qfr_ir::{
    Control, NonUnitaryOperation, OpType, Operation, QuantumComputation, QubitId,
    StandardOperation,
};
use qfr_qasm::{emit, parse};

#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    Z(u32),
    Rz(u32, f64),
    U3(u32, f64, f64, f64),
    Cx(u32, u32),
    Ccx(u32, u32, u32),
    Swap(u32, u32),
}

impl GateOp {
    fn apply(&self, qc: &mut QuantumComputation) {
        let total = qc.total_qubits();
        let op: Operation = match *self {
            GateOp::H(q) => StandardOperation::new(total, OpType::H, QubitId(q)).into(),
            GateOp::X(q) => StandardOperation::new(total, OpType::X, QubitId(q)).into(),
            GateOp::Z(q) => StandardOperation::new(total, OpType::Z, QubitId(q)).into(),
            GateOp::Rz(q, theta) => StandardOperation::new(total, OpType::Rz, QubitId(q))
                .with_params(&[theta])
                .into(),
            GateOp::U3(q, theta, phi, lambda) => {
                StandardOperation::new(total, OpType::U3, QubitId(q))
                    .with_params(&[theta, phi, lambda])
                    .into()
            }
            GateOp::Cx(c, t) => StandardOperation::controlled(
                total,
                OpType::X,
                vec![Control::pos(QubitId(c))],
                QubitId(t),
            )
            .into(),
            GateOp::Ccx(c0, c1, t) => StandardOperation::controlled(
                total,
                OpType::X,
                vec![Control::pos(QubitId(c0)), Control::pos(QubitId(c1))],
                QubitId(t),
            )
            .into(),
            GateOp::Swap(a, b) => {
                StandardOperation::two_target(total, OpType::Swap, vec![], QubitId(a), QubitId(b))
                    .into()
            }
        };
        qc.push(op);
    }
}

fn arb_angle() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(std::f64::consts::PI),
        Just(std::f64::consts::FRAC_PI_2),
        -10.0..10.0f64,
    ]
}

fn arb_gate_op(num_qubits: u32) -> BoxedStrategy<GateOp> {
    let q = 0..num_qubits;
    if num_qubits < 2 {
        prop_oneof![
            q.clone().prop_map(GateOp::H),
            q.clone().prop_map(GateOp::X),
            q.clone().prop_map(GateOp::Z),
            (q.clone(), arb_angle()).prop_map(|(q, a)| GateOp::Rz(q, a)),
            (q, arb_angle(), arb_angle(), arb_angle())
                .prop_map(|(q, t, p, l)| GateOp::U3(q, t, p, l)),
        ]
        .boxed()
    } else {
        let distinct_pair = (0..num_qubits, 0..num_qubits)
            .prop_filter("operands must differ", |(a, b)| a != b);
        let mut options = vec![
            q.clone().prop_map(GateOp::H).boxed(),
            q.clone().prop_map(GateOp::X).boxed(),
            (q.clone(), arb_angle())
                .prop_map(|(q, a)| GateOp::Rz(q, a))
                .boxed(),
            distinct_pair
                .clone()
                .prop_map(|(c, t)| GateOp::Cx(c, t))
                .boxed(),
            distinct_pair.prop_map(|(a, b)| GateOp::Swap(a, b)).boxed(),
        ];
        if num_qubits >= 3 {
            options.push(
                (0..num_qubits, 0..num_qubits, 0..num_qubits)
                    .prop_filter("operands must differ", |(a, b, c)| {
                        a != b && a != c && b != c
                    })
                    .prop_map(|(c0, c1, t)| GateOp::Ccx(c0, c1, t))
                    .boxed(),
            );
        }
        proptest::strategy::Union::new(options).boxed()
    }
}

fn arb_circuit() -> impl Strategy<Value = QuantumComputation> {
    (1u32..=5).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate_op(num_qubits), 0..=12).prop_map(move |ops| {
            let mut qc = QuantumComputation::new("random");
            qc.add_qubit_register(num_qubits, "q").unwrap();
            qc.add_classical_register(num_qubits, "c").unwrap();
            for op in &ops {
                op.apply(&mut qc);
            }
            qc
        })
    })
}

fn normalize(ops: &[Operation]) -> Vec<Operation> {
    let mut flat = vec![];
    for op in ops {
        match op {
            Operation::Compound(c) => flat.extend(normalize(&c.ops)),
            other => flat.push(other.clone()),
        }
    }
    flat
}

proptest! {
    /// Emit-then-parse reproduces the operation sequence exactly,
    /// including arbitrary rotation angles.
    #[test]
    fn roundtrip_preserves_operations(qc in arb_circuit()) {
        let emitted = emit(&qc).expect("emission failed");
        let reparsed = parse(&emitted)
            .unwrap_or_else(|e| panic!("re-parse failed: {e}\n{emitted}"));

        prop_assert_eq!(normalize(qc.ops()), normalize(reparsed.ops()));
        prop_assert_eq!(qc.num_qubits(), reparsed.num_qubits());
        prop_assert_eq!(qc.num_classics(), reparsed.num_classics());
    }

    /// Emission is deterministic.
    #[test]
    fn emission_is_deterministic(qc in arb_circuit()) {
        let first = emit(&qc).expect("first emission failed");
        let second = emit(&qc).expect("second emission failed");
        prop_assert_eq!(first, second);
    }

    /// A final whole-register measurement always folds to one line.
    #[test]
    fn whole_register_measure_folds(num_qubits in 1u32..=5) {
        let mut qc = QuantumComputation::new("measured");
        qc.add_qubit_register(num_qubits, "q").unwrap();
        qc.add_classical_register(num_qubits, "c").unwrap();
        let qubits = (0..num_qubits).map(QubitId).collect();
        let classics = (0..num_qubits).map(qfr_ir::ClbitId).collect();
        qc.push(NonUnitaryOperation::measure(num_qubits, qubits, classics).unwrap());

        let emitted = emit(&qc).expect("emission failed");
        prop_assert!(emitted.contains("measure q -> c;"));
    }
}
