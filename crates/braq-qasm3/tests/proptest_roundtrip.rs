//! Property-based tests for QASM3 roundtrip conversion.
//!
//! Tests that circuit → QASM3 → circuit preserves instructions, measure
//! order, result types and free parameters.

use braq_ir::{
    Circuit, FreeParameterExpression as Expr, Gate, Instruction, Observable, Qubit, ResultType,
};
use braq_qasm3::{IrType, QubitReferenceType, SerializationProperties, from_ir, to_ir};
use proptest::prelude::*;

/// Gate operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    Rx(u32, Expr),
    Rz(u32, Expr),
    CNot(u32, u32),
    XX(u32, u32, Expr),
    CPhaseShift(u32, u32, Expr),
}

impl GateOp {
    fn apply(self, circuit: &mut Circuit) {
        let (gate, target) = match self {
            GateOp::H(q) => (Gate::H, vec![q]),
            GateOp::X(q) => (Gate::X, vec![q]),
            GateOp::Rx(q, a) => (Gate::Rx(a), vec![q]),
            GateOp::Rz(q, a) => (Gate::Rz(a), vec![q]),
            GateOp::CNot(c, t) => (Gate::CNot, vec![c, t]),
            GateOp::XX(a, b, angle) => (Gate::XX(angle), vec![a, b]),
            GateOp::CPhaseShift(c, t, angle) => (Gate::CPhaseShift(angle), vec![c, t]),
        };
        let target: Vec<Qubit> = target.into_iter().map(Qubit).collect();
        circuit
            .add_instruction(Instruction::gate(gate, &target).unwrap())
            .unwrap();
    }
}

/// Numeric angles, free parameters and small expressions over them.
fn arb_angle() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (-10.0_f64..10.0).prop_map(Expr::Number),
        Just(Expr::Number(std::f64::consts::PI)),
        prop::sample::select(vec!["theta", "phi", "alpha"]).prop_map(|p| Expr::parameter(p)),
        ((-4.0_f64..4.0), prop::sample::select(vec!["theta", "phi"]))
            .prop_map(|(v, p)| Expr::parameter(p) * Expr::Number(v)),
        prop::sample::select(vec!["theta", "phi"]).prop_map(|p| -Expr::parameter(p)),
    ]
}

/// Generate a random gate operation for a circuit with given number of qubits.
fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    let pair = (0..num_qubits, 0..num_qubits)
        .prop_filter("Control and target must differ", |(c, t)| c != t);
    prop_oneof![
        (0..num_qubits).prop_map(GateOp::H),
        (0..num_qubits).prop_map(GateOp::X),
        (0..num_qubits, arb_angle()).prop_map(|(q, a)| GateOp::Rx(q, a)),
        (0..num_qubits, arb_angle()).prop_map(|(q, a)| GateOp::Rz(q, a)),
        pair.clone().prop_map(|(c, t)| GateOp::CNot(c, t)),
        (pair.clone(), arb_angle()).prop_map(|((a, b), angle)| GateOp::XX(a, b, angle)),
        (pair, arb_angle()).prop_map(|((c, t), angle)| GateOp::CPhaseShift(c, t, angle)),
    ]
}

/// Generate a random circuit on 2-5 qubits, measured in a random order.
fn arb_measured_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=5).prop_flat_map(|num_qubits| {
        (
            prop::collection::vec(arb_gate_op(num_qubits), 1..=12),
            Just((0..num_qubits).collect::<Vec<_>>()).prop_shuffle(),
        )
            .prop_map(|(ops, order)| {
                let mut circuit = Circuit::new();
                for op in ops {
                    op.apply(&mut circuit);
                }
                let order: Vec<Qubit> = order.into_iter().map(Qubit).collect();
                circuit.measure(&order).unwrap();
                circuit
            })
    })
}

/// Generate a random circuit ending in an observable result type.
fn arb_observed_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=4).prop_flat_map(|num_qubits| {
        (
            prop::collection::vec(arb_gate_op(num_qubits), 1..=8),
            prop::collection::vec(0_u8..4, num_qubits as usize),
        )
            .prop_map(move |(ops, paulis)| {
                let mut circuit = Circuit::new();
                for op in ops {
                    op.apply(&mut circuit);
                }
                let factors: Vec<Observable> = paulis
                    .into_iter()
                    .map(|p| match p {
                        0 => Observable::PauliX,
                        1 => Observable::PauliY,
                        2 => Observable::PauliZ,
                        _ => Observable::Hadamard,
                    })
                    .collect();
                let target: Vec<Qubit> = (0..num_qubits).map(Qubit).collect();
                let observable = Observable::tensor_product(factors).unwrap();
                circuit
                    .add_result_type(ResultType::expectation(observable, target).unwrap())
                    .unwrap();
                circuit
            })
    })
}

fn openqasm(circuit: &Circuit, qubit_reference_type: QubitReferenceType) -> String {
    let properties = SerializationProperties {
        qubit_reference_type,
    };
    to_ir(circuit, IrType::OpenQasm, &properties, None)
        .expect("Failed to convert circuit to QASM3")
        .as_openqasm()
        .expect("Expected an OpenQASM program")
        .source
        .clone()
}

proptest! {
    /// Circuit → QASM3 → circuit yields an equal circuit.
    #[test]
    fn test_measured_circuit_roundtrip(circuit in arb_measured_circuit()) {
        let qasm = openqasm(&circuit, QubitReferenceType::Virtual);
        let parsed = from_ir(&qasm).expect("Failed to parse QASM3 back to circuit");

        prop_assert_eq!(&parsed, &circuit);
        prop_assert_eq!(parsed.parameters(), circuit.parameters());
        prop_assert_eq!(parsed.measure_targets(), circuit.measure_targets());
    }

    /// Physical qubit references round-trip to the same qubit indices.
    #[test]
    fn test_physical_roundtrip(circuit in arb_measured_circuit()) {
        let qasm = openqasm(&circuit, QubitReferenceType::Physical);
        prop_assert!(!qasm.contains("qubit["));

        let parsed = from_ir(&qasm).expect("Failed to parse QASM3 back to circuit");
        prop_assert_eq!(parsed, circuit);
    }

    /// Result types and their basis rotations survive the roundtrip.
    #[test]
    fn test_result_type_roundtrip(circuit in arb_observed_circuit()) {
        let qasm = openqasm(&circuit, QubitReferenceType::Virtual);
        let parsed = from_ir(&qasm).expect("Failed to parse QASM3 back to circuit");

        prop_assert_eq!(parsed.result_types(), circuit.result_types());
        prop_assert_eq!(
            parsed.basis_rotation_instructions(),
            circuit.basis_rotation_instructions()
        );
    }

    /// Test that QASM3 generation is deterministic.
    #[test]
    fn test_qasm_generation_is_deterministic(circuit in arb_measured_circuit()) {
        let qasm1 = openqasm(&circuit, QubitReferenceType::Virtual);
        let qasm2 = openqasm(&circuit, QubitReferenceType::Virtual);

        prop_assert_eq!(qasm1, qasm2, "QASM3 generation is not deterministic");
    }
}
