//! Braq Circuit Intermediate Representation
//!
//! This crate provides the in-memory circuit model for Braket-style quantum
//! programs: the circuit builder, observable bookkeeping for result types,
//! gate calibrations and JAQCD serialization. OpenQASM 3 lives in
//! `braq-qasm3`.
//!
//! # Core Components
//!
//! - **Qubits**: [`Qubit`] and the ordered, deduplicated [`QubitSet`]
//! - **Gates and noise**: [`Gate`] for the Braket gate set, [`Noise`] for channels
//! - **Parameters**: [`FreeParameterExpression`] for symbolic gate and pulse arguments
//! - **Instructions**: [`Instruction`] combining an [`Operator`] with targets,
//!   arranged by time step in [`Moments`]
//! - **Observables and result types**: [`Observable`], [`ResultType`] and the
//!   per-qubit [`ObservableMapping`] deciding whether all observables commute
//! - **Pulses and calibrations**: [`PulseSequence`], [`GateCalibrations`] and
//!   [`resolve_calibrations`]
//! - **Circuit**: [`Circuit`] high-level builder API
//!
//! # Example: Sampling a Bell State
//!
//! ```rust
//! use braq_ir::{Circuit, Observable, Qubit, ResultType};
//!
//! let mut circuit = Circuit::new();
//! circuit.h(Qubit(0)).unwrap();
//! circuit.cnot(Qubit(0), Qubit(1)).unwrap();
//!
//! let xx = Observable::tensor_product(vec![Observable::PauliX, Observable::PauliX]).unwrap();
//! circuit
//!     .add_result_type(ResultType::expectation(xx, [Qubit(0), Qubit(1)]).unwrap())
//!     .unwrap();
//!
//! assert!(circuit.observables_simultaneously_measurable());
//! // One Hadamard per qubit rotates X into the computational basis.
//! assert_eq!(circuit.basis_rotation_instructions().len(), 2);
//! ```
//!
//! # Example: Conflicting Observables
//!
//! ```rust
//! use braq_ir::{Circuit, Observable, Qubit, ResultType};
//!
//! let mut circuit = Circuit::new();
//! circuit.h(Qubit(0)).unwrap();
//! circuit
//!     .add_result_type(ResultType::expectation(Observable::PauliY, Qubit(0)).unwrap())
//!     .unwrap()
//!     .add_result_type(ResultType::expectation(Observable::PauliX, Qubit(0)).unwrap())
//!     .unwrap();
//!
//! assert!(!circuit.observables_simultaneously_measurable());
//! assert!(circuit.basis_rotation_instructions().is_empty());
//! ```

pub mod calibration;
pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod jaqcd;
pub mod matrix;
pub mod moments;
pub mod noise;
pub mod observable;
pub mod observable_mapping;
pub mod parameter;
pub mod pulse;
pub mod qubit;
pub mod result_type;
pub mod validation;

pub use calibration::{
    resolve_calibrations, CalibrationDeclarations, CalibrationKey, Defcal, GateCalibrations,
};
pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::Gate;
pub use instruction::{CompilerDirective, Instruction, Operator, PulseGate};
pub use jaqcd::to_jaqcd;
pub use matrix::Matrix;
pub use moments::{MomentType, Moments, MomentsKey};
pub use noise::Noise;
pub use observable::{HermitianMatrix, Observable};
pub use observable_mapping::ObservableMapping;
pub use parameter::{format_number, FreeParameter, FreeParameterExpression};
pub use pulse::{Frame, Port, PulseInstruction, PulseSequence, Waveform};
pub use qubit::{Qubit, QubitSet};
pub use result_type::{ResultType, ResultTypeKind};
pub use validation::{validate_circuit_and_shots, MAX_PROBABILITY_QUBITS};
