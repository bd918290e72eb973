//! JAQCD (JSON Amazon Quantum Circuit Description) serialization.

use serde_json::{json, Map, Value};

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::instruction::{Instruction, Operator};
use crate::matrix::Matrix;
use crate::noise::Noise;
use crate::observable::Observable;
use crate::qubit::QubitSet;
use crate::result_type::ResultType;

const IR: &str = "JAQCD";

fn unsupported(what: impl Into<String>) -> IrError {
    IrError::Unsupported {
        ir: IR,
        what: what.into(),
    }
}

/// Serialize `circuit` as a JAQCD program.
///
/// # Errors
///
/// JAQCD has no form for measure instructions, pulse gates, verbatim
/// boxes, free parameters, adjoint gradients or the native ion gates.
pub fn to_jaqcd(circuit: &Circuit) -> IrResult<Value> {
    if let Some(parameter) = circuit.parameters().iter().next() {
        return Err(unsupported(format!("free parameter '{parameter}'")));
    }
    let instructions = circuit
        .instructions()
        .map(instruction_to_jaqcd)
        .collect::<IrResult<Vec<_>>>()?;

    let mut program = Map::new();
    program.insert(
        "braketSchemaHeader".into(),
        json!({"name": "braket.ir.jaqcd.program", "version": "1"}),
    );
    program.insert("instructions".into(), Value::Array(instructions));

    if !circuit.result_types().is_empty() {
        let results = circuit
            .result_types()
            .iter()
            .map(result_type_to_jaqcd)
            .collect::<IrResult<Vec<_>>>()?;
        program.insert("results".into(), Value::Array(results));
    }
    let rotations = circuit.basis_rotation_instructions();
    if !rotations.is_empty() {
        let rotations = rotations
            .iter()
            .map(instruction_to_jaqcd)
            .collect::<IrResult<Vec<_>>>()?;
        program.insert("basis_rotation_instructions".into(), Value::Array(rotations));
    }
    Ok(Value::Object(program))
}

fn instruction_to_jaqcd(instruction: &Instruction) -> IrResult<Value> {
    let target = instruction.target();
    match instruction.operator() {
        Operator::Gate(gate) => gate_to_jaqcd(gate, target),
        Operator::Noise(noise) => Ok(noise_to_jaqcd(noise, target)),
        Operator::Measure { .. } => Err(unsupported("measure instructions")),
        Operator::CompilerDirective(_) => Err(unsupported("verbatim boxes")),
        Operator::PulseGate(_) => Err(unsupported("pulse gates")),
    }
}

fn targets(target: &QubitSet) -> Vec<u32> {
    target.iter().map(|q| q.0).collect()
}

fn gate_to_jaqcd(gate: &Gate, target: &QubitSet) -> IrResult<Value> {
    let q = targets(target);
    let mut obj = Map::new();
    obj.insert("type".into(), json!(gate.qasm_name()));

    match gate {
        Gate::U(..) | Gate::GPi(_) | Gate::GPi2(_) | Gate::MS(..) | Gate::PRx(..) => {
            return Err(unsupported(format!("gate '{}'", gate.qasm_name())));
        }
        Gate::CNot | Gate::CY | Gate::CZ | Gate::CV | Gate::CPhaseShift(_)
        | Gate::CPhaseShift00(_) | Gate::CPhaseShift01(_) | Gate::CPhaseShift10(_) => {
            obj.insert("control".into(), json!(q[0]));
            obj.insert("target".into(), json!(q[1]));
        }
        Gate::CCNot => {
            obj.insert("controls".into(), json!(&q[..2]));
            obj.insert("target".into(), json!(q[2]));
        }
        Gate::CSwap => {
            obj.insert("control".into(), json!(q[0]));
            obj.insert("targets".into(), json!(&q[1..]));
        }
        Gate::Unitary(matrix) => {
            obj.insert("targets".into(), json!(q));
            obj.insert("matrix".into(), matrix_to_jaqcd(matrix));
        }
        _ if gate.qubit_count() == 1 => {
            obj.insert("target".into(), json!(q[0]));
        }
        _ => {
            obj.insert("targets".into(), json!(q));
        }
    }

    if let [angle] = gate.parameters().as_slice() {
        let value = angle
            .as_f64()
            .ok_or_else(|| unsupported(format!("symbolic angle '{angle}'")))?;
        obj.insert("angle".into(), json!(value));
    }
    Ok(Value::Object(obj))
}

fn noise_to_jaqcd(noise: &Noise, target: &QubitSet) -> Value {
    let q = targets(target);
    let mut obj = Map::new();
    obj.insert("type".into(), json!(noise.qasm_name()));
    if noise.qubit_count() == 1 {
        obj.insert("target".into(), json!(q[0]));
    } else {
        obj.insert("targets".into(), json!(q));
    }
    match noise {
        Noise::BitFlip { probability }
        | Noise::PhaseFlip { probability }
        | Noise::Depolarizing { probability }
        | Noise::TwoQubitDepolarizing { probability }
        | Noise::TwoQubitDephasing { probability } => {
            obj.insert("probability".into(), json!(probability));
        }
        Noise::PauliChannel {
            probability_x,
            probability_y,
            probability_z,
        } => {
            obj.insert("probX".into(), json!(probability_x));
            obj.insert("probY".into(), json!(probability_y));
            obj.insert("probZ".into(), json!(probability_z));
        }
        Noise::AmplitudeDamping { gamma } | Noise::PhaseDamping { gamma } => {
            obj.insert("gamma".into(), json!(gamma));
        }
        Noise::GeneralizedAmplitudeDamping { gamma, probability } => {
            obj.insert("gamma".into(), json!(gamma));
            obj.insert("probability".into(), json!(probability));
        }
    }
    Value::Object(obj)
}

/// Complex matrices are nested `[re, im]` pairs.
fn matrix_to_jaqcd(matrix: &Matrix) -> Value {
    Value::Array(
        matrix
            .rows()
            .map(|row| Value::Array(row.iter().map(|c| json!([c.re, c.im])).collect()))
            .collect(),
    )
}

fn observable_to_jaqcd(observable: &Observable) -> Value {
    Value::Array(
        observable
            .factors()
            .iter()
            .map(|factor| match factor {
                Observable::Identity => json!("i"),
                Observable::PauliX => json!("x"),
                Observable::PauliY => json!("y"),
                Observable::PauliZ => json!("z"),
                Observable::Hadamard => json!("h"),
                Observable::Hermitian(h) => matrix_to_jaqcd(h.matrix()),
                // Factors are flattened on construction.
                Observable::TensorProduct(_) => Value::Null,
            })
            .collect(),
    )
}

fn result_type_to_jaqcd(result_type: &ResultType) -> IrResult<Value> {
    let mut obj = Map::new();
    let name = match result_type {
        ResultType::StateVector => "statevector",
        ResultType::DensityMatrix { .. } => "densitymatrix",
        ResultType::AdjointGradient { .. } => {
            return Err(unsupported("adjoint_gradient result type"));
        }
        other => other.name(),
    };
    obj.insert("type".into(), json!(name));
    if let Some(observable) = result_type.observable() {
        obj.insert("observable".into(), observable_to_jaqcd(observable));
    }
    if let Some(target) = result_type.target() {
        if !target.is_empty() {
            obj.insert("targets".into(), json!(targets(target)));
        }
    }
    if let ResultType::Amplitude { states } = result_type {
        obj.insert("states".into(), json!(states));
    }
    Ok(Value::Object(obj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::FreeParameterExpression;
    use crate::qubit::Qubit;

    #[test]
    fn test_bell_program() {
        let mut circuit = Circuit::new();
        circuit
            .h(Qubit(0))
            .unwrap()
            .cnot(Qubit(0), Qubit(1))
            .unwrap()
            .rx(0.15, Qubit(1))
            .unwrap()
            .add_result_type(ResultType::expectation(Observable::PauliX, Qubit(1)).unwrap())
            .unwrap();
        let program = to_jaqcd(&circuit).unwrap();
        assert_eq!(
            program["instructions"],
            json!([
                {"type": "h", "target": 0},
                {"type": "cnot", "control": 0, "target": 1},
                {"type": "rx", "target": 1, "angle": 0.15},
            ])
        );
        assert_eq!(
            program["results"],
            json!([{"type": "expectation", "observable": ["x"], "targets": [1]}])
        );
        assert_eq!(
            program["basis_rotation_instructions"],
            json!([{"type": "h", "target": 1}])
        );
    }

    #[test]
    fn test_noise_and_ccnot() {
        let mut circuit = Circuit::new();
        circuit
            .ccnot(Qubit(0), Qubit(1), Qubit(2))
            .unwrap()
            .noise(Noise::TwoQubitDephasing { probability: 0.1 }, &[Qubit(0), Qubit(1)])
            .unwrap();
        let program = to_jaqcd(&circuit).unwrap();
        assert_eq!(
            program["instructions"][0],
            json!({"type": "ccnot", "controls": [0, 1], "target": 2})
        );
        assert_eq!(
            program["instructions"][1],
            json!({"type": "two_qubit_dephasing", "targets": [0, 1], "probability": 0.1})
        );
        assert!(program.get("results").is_none());
    }

    #[test]
    fn test_unsupported_constructs() {
        let mut measured = Circuit::new();
        measured.h(Qubit(0)).unwrap().measure(&[Qubit(0)]).unwrap();
        assert!(matches!(
            to_jaqcd(&measured),
            Err(IrError::Unsupported { ir: "JAQCD", .. })
        ));

        let mut parametric = Circuit::new();
        parametric
            .rx(FreeParameterExpression::parameter("theta"), Qubit(0))
            .unwrap();
        assert!(to_jaqcd(&parametric).is_err());

        let mut native = Circuit::new();
        native.gpi(0.1, Qubit(0)).unwrap();
        assert!(to_jaqcd(&native).is_err());
    }
}
