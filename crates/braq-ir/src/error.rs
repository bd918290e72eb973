//! Error types for the IR crate.

use crate::qubit::Qubit;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operator requires a different number of qubits.
    #[error("'{name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the operator.
        name: String,
        /// Expected number of qubits.
        expected: usize,
        /// Actual number of qubits provided.
        got: usize,
    },

    /// Duplicate qubit in an operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: Qubit,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// A gate or noise operation touches a qubit that was already measured.
    #[error("cannot apply instruction to measured qubit {0}")]
    QubitAlreadyMeasured(Qubit),

    /// The same qubit appears twice in one measure call.
    #[error("cannot repeat qubit(s) {0} in the same measurement")]
    RepeatedMeasureQubit(String),

    /// Measurements and result types cannot be mixed.
    #[error("a circuit cannot contain both measure instructions and result types")]
    MeasureWithResultTypes,

    /// A result type was added after a measure instruction.
    #[error("cannot add a result type to a circuit which already contains a measure instruction")]
    ResultTypeAfterMeasure,

    /// Observable and target sizes disagree.
    #[error("observable acts on {observable} qubits but {target} target qubits were given")]
    ObservableTargetMismatch {
        /// Qubit count of the observable.
        observable: usize,
        /// Number of target qubits.
        target: usize,
    },

    /// A result type was constructed with invalid arguments.
    #[error("Invalid result type: {0}")]
    InvalidResultType(String),

    /// A subcircuit cannot be embedded.
    #[error("Invalid subcircuit: {0}")]
    InvalidSubcircuit(String),

    /// Matrix is not square with a power-of-two dimension, or has the wrong size.
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),

    /// Matrix passed to a Hermitian observable is not Hermitian.
    #[error("matrix is not Hermitian")]
    NonHermitian,

    /// A tensor product needs at least two factors.
    #[error("a tensor product requires at least 2 factors, got {0}")]
    TensorProductTooSmall(usize),

    /// A noise channel parameter is out of range.
    #[error("{name} parameter {value} must be within [0, {max}]")]
    InvalidNoiseParameter {
        /// Channel name.
        name: String,
        /// The rejected value.
        value: f64,
        /// Upper bound of the valid range.
        max: f64,
    },

    /// A gate angle is NaN or infinite.
    #[error("'{gate}' has a non-finite angle {angle}")]
    NonFiniteAngle {
        /// Name of the gate.
        gate: String,
        /// The offending angle expression.
        angle: String,
    },

    /// Parameter is unbound.
    #[error("Parameter '{0}' is unbound")]
    UnboundParameter(String),

    /// Strict binding was given a parameter the circuit does not use.
    #[error("No parameter in the circuit named: {0}")]
    UnknownParameter(String),

    /// A calibration fixes some but not all of its gate parameters.
    #[error("Calibrations with a partial number of fixed parameters are not supported")]
    PartiallyBoundCalibration,

    /// A parametric calibration matches an instruction that is itself still parametric.
    #[error("Parametric calibrations cannot be attached with parametric circuits")]
    ParametricCalibrationOnParametricCircuit,

    /// A calibration gate parameter is a compound expression instead of a bare parameter.
    #[error("calibration parameter '{0}' must be a single free parameter")]
    UnsupportedCalibrationParameter(String),

    /// Two different frames or waveforms share an id.
    #[error("{kind} '{id}' has a non-unique id. Please use distinct ids for different frames/waveforms")]
    NonUniqueResourceId {
        /// "frame" or "waveform".
        kind: &'static str,
        /// The colliding id.
        id: String,
    },

    /// The circuit cannot be run with the requested number of shots.
    #[error("Invalid circuit for execution: {0}")]
    InvalidForShots(String),

    /// The requested IR cannot express part of the circuit.
    #[error("Unsupported in {ir}: {what}")]
    Unsupported {
        /// Name of the IR.
        ir: &'static str,
        /// What could not be expressed.
        what: String,
    },
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_messages() {
        assert_eq!(
            IrError::PartiallyBoundCalibration.to_string(),
            "Calibrations with a partial number of fixed parameters are not supported"
        );
        assert!(
            IrError::ParametricCalibrationOnParametricCircuit
                .to_string()
                .contains("parametric circuits")
        );
    }

    #[test]
    fn test_duplicate_qubit_context() {
        let err = IrError::DuplicateQubit {
            qubit: Qubit(3),
            gate_name: Some("cnot".into()),
        };
        assert_eq!(err.to_string(), "Duplicate qubit 3 in operation (gate: cnot)");
    }
}
