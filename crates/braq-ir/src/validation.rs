//! Checks run before a circuit is submitted for execution.

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::result_type::ResultType;

/// Largest number of qubits a probability result may cover when sampling.
pub const MAX_PROBABILITY_QUBITS: usize = 40;

/// Check that `circuit` can run with `shots` shots.
///
/// With zero shots the circuit needs result types, which are computed
/// exactly. With shots, every result type must be sampleable.
pub fn validate_circuit_and_shots(circuit: &Circuit, shots: u64) -> IrResult<()> {
    if circuit.instructions().next().is_none() {
        return Err(IrError::InvalidForShots(
            "circuit must have instructions to run on a device".into(),
        ));
    }
    if shots == 0 {
        if circuit.result_types().is_empty() {
            return Err(IrError::InvalidForShots(
                "no result types specified for circuit and shots=0".into(),
            ));
        }
        return Ok(());
    }
    if circuit.result_types().is_empty() {
        return Ok(());
    }
    if !circuit.observables_simultaneously_measurable() {
        return Err(IrError::InvalidForShots(
            "observables cannot be sampled simultaneously".into(),
        ));
    }
    for result_type in circuit.result_types() {
        match result_type {
            ResultType::StateVector | ResultType::Amplitude { .. } => {
                return Err(IrError::InvalidForShots(
                    "state_vector or amplitude cannot be specified when shots>0".into(),
                ));
            }
            ResultType::AdjointGradient { .. } => {
                return Err(IrError::InvalidForShots(
                    "adjoint_gradient cannot be specified when shots>0".into(),
                ));
            }
            ResultType::Probability { target } => {
                let qubits = if target.is_empty() {
                    circuit.qubit_count()
                } else {
                    target.len()
                };
                if qubits > MAX_PROBABILITY_QUBITS {
                    return Err(IrError::InvalidForShots(format!(
                        "probability target must be at most {MAX_PROBABILITY_QUBITS} qubits"
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
