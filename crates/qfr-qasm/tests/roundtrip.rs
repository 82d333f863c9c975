//! Round-trip tests: emitting an accepted program and re-parsing it must
//! reproduce the operation sequence, under a structural equivalence that
//! flattens broadcast-expanded compounds into their element-wise standards.

use qfr_ir::{Operation, QuantumComputation};
use qfr_qasm::{emit, parse};

/// Flatten compounds so `h q;` and three `h q[i];` lines compare equal.
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

fn assert_roundtrip(source: &str) -> QuantumComputation {
    let first = parse(source).expect("initial parse failed");
    let emitted = emit(&first).expect("emission failed");
    let second = parse(&emitted)
        .unwrap_or_else(|e| panic!("re-parse failed: {e}\nemitted:\n{emitted}"));

    assert_eq!(
        normalize(first.ops()),
        normalize(second.ops()),
        "operation sequences differ\nemitted:\n{emitted}"
    );
    assert_eq!(first.num_qubits(), second.num_qubits());
    assert_eq!(first.num_classics(), second.num_classics());
    second
}

#[test]
fn roundtrip_bell_pair() {
    let qc = assert_roundtrip(
        "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;",
    );
    let emitted = emit(&qc).unwrap();
    assert!(emitted.contains("measure q -> c;"));
}

#[test]
fn roundtrip_u_parameter_value() {
    let first = parse("OPENQASM 2.0;\nqreg q[1];\nU(0,0,pi/2) q[0];").unwrap();
    let emitted = emit(&first).unwrap();
    let second = parse(&emitted).unwrap();

    let lambda = |qc: &QuantumComputation| match &qc.ops()[0] {
        Operation::Standard(op) => op.params[2],
        other => panic!("expected U3, got {other:?}"),
    };
    assert_eq!(lambda(&first), lambda(&second));
    assert_eq!(lambda(&first), std::f64::consts::FRAC_PI_2);
}

#[test]
fn roundtrip_broadcast_equals_elementwise() {
    let broadcast = parse("OPENQASM 2.0;\nqreg q[3];\nh q;").unwrap();
    let elementwise = parse("OPENQASM 2.0;\nqreg q[3];\nh q[0];\nh q[1];\nh q[2];").unwrap();
    assert_eq!(normalize(broadcast.ops()), normalize(elementwise.ops()));
}

#[test]
fn roundtrip_rotations_and_phases() {
    assert_roundtrip(
        "OPENQASM 2.0;\nqreg q[2];\nrx(0.125) q[0];\nry(pi/4) q[1];\nrz(-0.75) q[0];\nu1(0.3) q[1];\nu2(0.1,0.2) q[0];\nu3(0.1,0.2,0.3) q[1];\ns q[0];\nsdg q[1];\nt q[0];\ntdg q[1];",
    );
}

#[test]
fn roundtrip_controlled_forms() {
    assert_roundtrip(
        "OPENQASM 2.0;\nqreg q[4];\ncz q[0],q[1];\nch q[1],q[2];\nccx q[0],q[1],q[2];\ncccx q[0],q[1],q[2],q[3];\ncu3(0.5,0.25,0.125) q[0],q[1];\ncrz(0.5) q[2],q[3];\ncswap q[0],q[1],q[2];\nswap q[2],q[3];",
    );
}

#[test]
fn roundtrip_non_unitary_forms() {
    assert_roundtrip(
        "OPENQASM 2.0;\nqreg q[3];\ncreg c[3];\nh q;\nbarrier q;\nreset q[1];\nsnapshot(1) q[0], q[1];\nshow_probabilities;\nmeasure q -> c;",
    );
}

#[test]
fn roundtrip_classically_controlled() {
    assert_roundtrip(
        "OPENQASM 2.0;\nqreg q[1];\ncreg c[1];\nh q[0];\nmeasure q -> c;\nif (c == 1) x q[0];",
    );
}

#[test]
fn roundtrip_user_gate_macro() {
    assert_roundtrip(
        "OPENQASM 2.0;\nqreg q[2];\ngate bell a,b { h a; cx a,b; }\nbell q[0],q[1];",
    );
}

#[test]
fn roundtrip_layout_comments() {
    let source = "// i 1 0\n// o 1 0\nOPENQASM 2.0;\nqreg q[2];\nh q[0];\nh q[1];";
    let first = parse(source).unwrap();
    let emitted = emit(&first).unwrap();
    assert!(emitted.starts_with("// i 1 0\n// o 1 0\n"));

    let second = parse(&emitted).unwrap();
    assert_eq!(first.initial_layout(), second.initial_layout());
    assert_eq!(first.output_permutation(), second.output_permutation());
}
