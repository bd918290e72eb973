//! High-level circuit builder API.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

use crate::calibration::{resolve_calibrations, CalibrationDeclarations, GateCalibrations};
use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::instruction::{CompilerDirective, Instruction, Operator, PulseGate};
use crate::matrix::Matrix;
use crate::moments::Moments;
use crate::noise::Noise;
use crate::observable_mapping::ObservableMapping;
use crate::parameter::{FreeParameter, FreeParameterExpression};
use crate::pulse::PulseSequence;
use crate::qubit::{Qubit, QubitSet};
use crate::result_type::{ResultType, ResultTypeKind};

/// A quantum circuit.
///
/// Instructions are placed on a [`Moments`] grid as they are added. Result
/// types feed the observable bookkeeping that decides whether all requested
/// observables can be sampled in one basis, and which basis rotations that
/// requires.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    moments: Moments,
    result_types: Vec<ResultType>,
    observables: ObservableMapping,
    parameters: BTreeSet<FreeParameter>,
    measure_targets: Vec<Qubit>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&mut self, gate: Gate, target: &[Qubit]) -> IrResult<&mut Self> {
        self.add_instruction(Instruction::gate(gate, target)?)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply identity gate.
    pub fn i(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::I, &[qubit])
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::H, &[qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::X, &[qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::Y, &[qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::Z, &[qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::S, &[qubit])
    }

    /// Apply S-dagger gate.
    pub fn si(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::Si, &[qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::T, &[qubit])
    }

    /// Apply T-dagger gate.
    pub fn ti(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::Ti, &[qubit])
    }

    /// Apply V (sqrt X) gate.
    pub fn v(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::V, &[qubit])
    }

    /// Apply V-dagger gate.
    pub fn vi(&mut self, qubit: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::Vi, &[qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        qubit: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::Rx(theta.into()), &[qubit])
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        qubit: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::Ry(theta.into()), &[qubit])
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        qubit: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::Rz(theta.into()), &[qubit])
    }

    /// Apply phase shift gate.
    pub fn phaseshift(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        qubit: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::PhaseShift(theta.into()), &[qubit])
    }

    /// Apply GPi gate.
    pub fn gpi(
        &mut self,
        phi: impl Into<FreeParameterExpression>,
        qubit: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::GPi(phi.into()), &[qubit])
    }

    /// Apply GPi2 gate.
    pub fn gpi2(
        &mut self,
        phi: impl Into<FreeParameterExpression>,
        qubit: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::GPi2(phi.into()), &[qubit])
    }

    /// Apply universal U gate.
    pub fn u(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        phi: impl Into<FreeParameterExpression>,
        lambda: impl Into<FreeParameterExpression>,
        qubit: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::U(theta.into(), phi.into(), lambda.into()), &[qubit])
    }

    /// Apply phased RX gate.
    pub fn prx(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        phi: impl Into<FreeParameterExpression>,
        qubit: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::PRx(theta.into(), phi.into()), &[qubit])
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cnot(&mut self, control: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::CNot, &[control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: Qubit, q2: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::Swap, &[q1, q2])
    }

    /// Apply iSWAP gate.
    pub fn iswap(&mut self, q1: Qubit, q2: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::ISwap, &[q1, q2])
    }

    /// Apply CY gate.
    pub fn cy(&mut self, control: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::CY, &[control, target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::CZ, &[control, target])
    }

    /// Apply ECR gate.
    pub fn ecr(&mut self, q1: Qubit, q2: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::ECR, &[q1, q2])
    }

    /// Apply controlled-V gate.
    pub fn cv(&mut self, control: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::CV, &[control, target])
    }

    /// Apply controlled phase shift.
    pub fn cphaseshift(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        control: Qubit,
        target: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::CPhaseShift(theta.into()), &[control, target])
    }

    /// Apply controlled phase shift on |00⟩.
    pub fn cphaseshift00(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        control: Qubit,
        target: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::CPhaseShift00(theta.into()), &[control, target])
    }

    /// Apply controlled phase shift on |01⟩.
    pub fn cphaseshift01(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        control: Qubit,
        target: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::CPhaseShift01(theta.into()), &[control, target])
    }

    /// Apply controlled phase shift on |10⟩.
    pub fn cphaseshift10(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        control: Qubit,
        target: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::CPhaseShift10(theta.into()), &[control, target])
    }

    /// Apply Ising XX coupling.
    pub fn xx(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        q1: Qubit,
        q2: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::XX(theta.into()), &[q1, q2])
    }

    /// Apply Ising YY coupling.
    pub fn yy(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        q1: Qubit,
        q2: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::YY(theta.into()), &[q1, q2])
    }

    /// Apply Ising ZZ coupling.
    pub fn zz(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        q1: Qubit,
        q2: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::ZZ(theta.into()), &[q1, q2])
    }

    /// Apply XY coupling.
    pub fn xy(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        q1: Qubit,
        q2: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::XY(theta.into()), &[q1, q2])
    }

    /// Apply parametrized SWAP.
    pub fn pswap(
        &mut self,
        theta: impl Into<FreeParameterExpression>,
        q1: Qubit,
        q2: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::PSwap(theta.into()), &[q1, q2])
    }

    /// Apply Mølmer-Sørensen gate.
    pub fn ms(
        &mut self,
        phi0: impl Into<FreeParameterExpression>,
        phi1: impl Into<FreeParameterExpression>,
        theta: impl Into<FreeParameterExpression>,
        q1: Qubit,
        q2: Qubit,
    ) -> IrResult<&mut Self> {
        self.apply(Gate::MS(phi0.into(), phi1.into(), theta.into()), &[q1, q2])
    }

    // =========================================================================
    // Three-qubit gates
    // =========================================================================

    /// Apply Toffoli gate.
    pub fn ccnot(&mut self, c1: Qubit, c2: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::CCNot, &[c1, c2, target])
    }

    /// Apply Fredkin gate.
    pub fn cswap(&mut self, control: Qubit, t1: Qubit, t2: Qubit) -> IrResult<&mut Self> {
        self.apply(Gate::CSwap, &[control, t1, t2])
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply an arbitrary unitary.
    pub fn unitary(&mut self, matrix: Matrix, target: &[Qubit]) -> IrResult<&mut Self> {
        if !matrix.is_unitary() {
            return Err(IrError::InvalidMatrix("matrix is not unitary".into()));
        }
        self.apply(Gate::Unitary(matrix), target)
    }

    /// Apply a gate implemented by a pulse sequence.
    pub fn pulse_gate(&mut self, sequence: PulseSequence, target: &[Qubit]) -> IrResult<&mut Self> {
        let operator = Operator::PulseGate(PulseGate {
            sequence,
            qubit_count: target.len(),
        });
        self.add_instruction(Instruction::new(operator, target)?)
    }

    /// Apply a noise channel.
    pub fn noise(&mut self, noise: Noise, target: &[Qubit]) -> IrResult<&mut Self> {
        self.add_instruction(Instruction::new(Operator::Noise(noise), target)?)
    }

    /// Measure `qubits`, appending to the measured qubits in order.
    ///
    /// # Errors
    ///
    /// Fails when result types exist, when a qubit repeats in `qubits`, or
    /// when a qubit was already measured.
    pub fn measure(&mut self, qubits: &[Qubit]) -> IrResult<&mut Self> {
        if !self.result_types.is_empty() {
            return Err(IrError::MeasureWithResultTypes);
        }
        let mut seen = QubitSet::new();
        let mut repeated = QubitSet::new();
        for &q in qubits {
            if !seen.insert(q) {
                repeated.insert(q);
            }
        }
        if !repeated.is_empty() {
            let names: Vec<String> = repeated.iter().map(|q| q.to_string()).collect();
            return Err(IrError::RepeatedMeasureQubit(names.join(", ")));
        }
        self.check_not_measured(&seen)?;
        for &q in qubits {
            let index = self.measure_targets.len();
            self.add_instruction(Instruction::new(Operator::Measure { index }, &[q])?)?;
        }
        Ok(self)
    }

    /// Wrap the instructions of `subcircuit` in a verbatim box.
    ///
    /// The subcircuit must not request result types.
    pub fn add_verbatim_box(&mut self, subcircuit: &Circuit) -> IrResult<&mut Self> {
        if !subcircuit.result_types.is_empty() {
            return Err(IrError::InvalidSubcircuit(
                "verbatim subcircuit is not measured and cannot have result types".into(),
            ));
        }
        self.add_instruction(Instruction::new(
            Operator::CompilerDirective(CompilerDirective::StartVerbatimBox),
            &[],
        )?)?;
        for instruction in subcircuit.instructions() {
            self.add_instruction(instruction.clone())?;
        }
        self.add_instruction(Instruction::new(
            Operator::CompilerDirective(CompilerDirective::EndVerbatimBox),
            &[],
        )?)
    }

    /// Append an instruction.
    ///
    /// # Errors
    ///
    /// Gate angles must be finite. Gates, noise and pulse gates cannot touch
    /// a measured qubit. Measure
    /// instructions follow the rules of [`Circuit::measure`].
    pub fn add_instruction(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        match instruction.operator() {
            Operator::Measure { .. } => {
                if !self.result_types.is_empty() {
                    return Err(IrError::MeasureWithResultTypes);
                }
                self.check_not_measured(instruction.target())?;
                self.measure_targets.extend(instruction.target().iter());
            }
            Operator::Gate(gate) => {
                if let Some(angle) = gate.parameters().into_iter().find(|p| !p.is_finite()) {
                    return Err(IrError::NonFiniteAngle {
                        gate: gate.qasm_name().to_string(),
                        angle: angle.to_string(),
                    });
                }
                self.check_not_measured(instruction.target())?;
            }
            Operator::Noise(_) | Operator::PulseGate(_) => {
                self.check_not_measured(instruction.target())?;
            }
            Operator::CompilerDirective(_) => {}
        }
        self.parameters
            .extend(instruction.operator().free_parameters());
        self.moments.add(instruction);
        Ok(self)
    }

    fn check_not_measured(&self, target: &QubitSet) -> IrResult<()> {
        match target.iter().find(|q| self.measure_targets.contains(q)) {
            Some(q) => Err(IrError::QubitAlreadyMeasured(q)),
            None => Ok(()),
        }
    }

    /// Request a result type.
    ///
    /// Duplicates are ignored. Observables are checked for compatibility
    /// with the ones already requested; an incompatible one does not fail
    /// but makes the circuit unsampleable with shots.
    pub fn add_result_type(&mut self, result_type: ResultType) -> IrResult<&mut Self> {
        if !self.measure_targets.is_empty() {
            return Err(IrError::ResultTypeAfterMeasure);
        }
        if self.result_types.contains(&result_type) {
            return Ok(self);
        }
        if let Some(observable) = result_type.measured_observable() {
            if let Some(target) = result_type.target() {
                self.observables.add(&observable, target);
            }
        }
        if matches!(
            result_type.kind(),
            ResultTypeKind::ObservableBased | ResultTypeKind::ParametricObservableBased
        ) {
            if let Some(target) = result_type.target() {
                self.observables.add_observable_qubits(target);
            }
        }
        self.result_types.push(result_type);
        Ok(self)
    }

    /// Append `other`, optionally moving its qubits through `mapping`.
    pub fn add_circuit(
        &mut self,
        other: &Circuit,
        mapping: Option<&FxHashMap<Qubit, Qubit>>,
    ) -> IrResult<&mut Self> {
        let identity = FxHashMap::default();
        let mapping = mapping.unwrap_or(&identity);
        for instruction in other.instructions() {
            self.add_instruction(instruction.remapped(mapping)?)?;
        }
        for result_type in &other.result_types {
            self.add_result_type(result_type.remapped(mapping))?;
        }
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Instructions in insertion order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.moments.instructions()
    }

    /// The moment grid.
    pub fn moments(&self) -> &Moments {
        &self.moments
    }

    /// Requested result types.
    pub fn result_types(&self) -> &[ResultType] {
        &self.result_types
    }

    /// Qubits used by instructions or observable result types.
    pub fn qubits(&self) -> QubitSet {
        self.moments.qubits().union(self.observables.observable_qubits())
    }

    /// Number of qubits used.
    pub fn qubit_count(&self) -> usize {
        self.qubits().len()
    }

    /// Number of time steps.
    pub fn depth(&self) -> usize {
        self.moments.depth()
    }

    /// Free parameters the circuit needs values for.
    pub fn parameters(&self) -> &BTreeSet<FreeParameter> {
        &self.parameters
    }

    /// Measured qubits in measurement order.
    pub fn measure_targets(&self) -> &[Qubit] {
        &self.measure_targets
    }

    /// Per-qubit observable state.
    pub fn observable_mapping(&self) -> &ObservableMapping {
        &self.observables
    }

    /// Whether all requested observables can be sampled in one basis.
    pub fn observables_simultaneously_measurable(&self) -> bool {
        self.observables.simultaneously_measurable()
    }

    /// Gates to append before sampling so every observable is read in the
    /// computational basis. Recomputed on each call.
    pub fn basis_rotation_instructions(&self) -> Vec<Instruction> {
        self.observables
            .basis_rotation_instructions(&self.qubits())
    }

    // =========================================================================
    // Parameters and calibrations
    // =========================================================================

    /// Copy of the circuit with parameter values substituted.
    ///
    /// With `strict`, every name in `values` must be a circuit parameter.
    pub fn make_bound_circuit(
        &self,
        values: &FxHashMap<String, f64>,
        strict: bool,
    ) -> IrResult<Circuit> {
        if strict {
            if let Some(unknown) = values
                .keys()
                .find(|name| !self.parameters.iter().any(|p| p.name() == name.as_str()))
            {
                return Err(IrError::UnknownParameter(unknown.clone()));
            }
        }
        let mut bound = Circuit::new();
        for instruction in self.instructions() {
            bound.add_instruction(instruction.with_operator(instruction.operator().bind(values)))?;
        }
        for result_type in &self.result_types {
            bound.add_result_type(result_type.clone())?;
        }
        Ok(bound)
    }

    /// Resolve `gate_definitions` against this circuit.
    ///
    /// Free parameters referenced by the declared calibrations become
    /// circuit parameters. See [`resolve_calibrations`] for the rules.
    pub fn calibration_declarations(
        &mut self,
        gate_definitions: &GateCalibrations,
    ) -> IrResult<Option<CalibrationDeclarations>> {
        let declarations = resolve_calibrations(self.moments.instructions(), gate_definitions)?;
        if let Some(decls) = &declarations {
            if !decls.parameters.is_empty() {
                debug!(count = decls.parameters.len(), "calibration parameters folded into circuit");
            }
            self.parameters.extend(decls.parameters.iter().cloned());
        }
        Ok(declarations)
    }
}

impl PartialEq for Circuit {
    fn eq(&self, other: &Self) -> bool {
        self.instructions().eq(other.instructions())
            && self.result_types == other.result_types
            && self.measure_targets == other.measure_targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::Observable;
    use std::f64::consts::PI;

    fn q(i: u32) -> Qubit {
        Qubit(i)
    }

    #[test]
    fn test_fluent_api() {
        let mut circuit = Circuit::new();
        circuit
            .h(q(0))
            .unwrap()
            .cnot(q(0), q(1))
            .unwrap()
            .measure(&[q(0)])
            .unwrap()
            .measure(&[q(1)])
            .unwrap();

        assert_eq!(circuit.instructions().count(), 4);
        assert_eq!(circuit.measure_targets(), &[q(0), q(1)]);
        assert_eq!(circuit.depth(), 3);
        assert_eq!(circuit.qubit_count(), 2);
    }

    #[test]
    fn test_measure_indices_follow_targets() {
        let mut circuit = Circuit::new();
        circuit.h(q(0)).unwrap().measure(&[q(1)]).unwrap().measure(&[q(0)]).unwrap();
        let indices: Vec<_> = circuit
            .instructions()
            .filter_map(|i| match i.operator() {
                Operator::Measure { index } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_measure_rules() {
        let mut circuit = Circuit::new();
        assert!(matches!(
            circuit.measure(&[q(0), q(0)]),
            Err(IrError::RepeatedMeasureQubit(_))
        ));
        circuit.measure(&[q(0)]).unwrap();
        assert!(matches!(
            circuit.measure(&[q(0)]),
            Err(IrError::QubitAlreadyMeasured(Qubit(0)))
        ));
        assert!(matches!(
            circuit.x(q(0)),
            Err(IrError::QubitAlreadyMeasured(Qubit(0)))
        ));
        assert!(circuit.x(q(1)).is_ok());
        assert!(matches!(
            circuit.add_result_type(ResultType::probability(q(1))),
            Err(IrError::ResultTypeAfterMeasure)
        ));
    }

    #[test]
    fn test_measure_refused_with_result_types() {
        let mut circuit = Circuit::new();
        circuit
            .h(q(0))
            .unwrap()
            .add_result_type(ResultType::probability(q(0)))
            .unwrap();
        assert!(matches!(
            circuit.measure(&[q(0)]),
            Err(IrError::MeasureWithResultTypes)
        ));
    }

    #[test]
    fn test_duplicate_result_type_ignored() {
        let mut circuit = Circuit::new();
        let rt = ResultType::expectation(Observable::PauliX, q(0)).unwrap();
        circuit.add_result_type(rt.clone()).unwrap();
        circuit.add_result_type(rt).unwrap();
        assert_eq!(circuit.result_types().len(), 1);
    }

    #[test]
    fn test_probability_implies_z() {
        let mut circuit = Circuit::new();
        circuit
            .h(q(0))
            .unwrap()
            .add_result_type(ResultType::probability(q(0)))
            .unwrap()
            .add_result_type(ResultType::expectation(Observable::PauliX, q(0)).unwrap())
            .unwrap();
        assert!(!circuit.observables_simultaneously_measurable());
    }

    #[test]
    fn test_basis_rotations_all_qubits() {
        let mut circuit = Circuit::new();
        circuit
            .h(q(0))
            .unwrap()
            .cnot(q(0), q(1))
            .unwrap()
            .add_result_type(ResultType::sample(Observable::PauliX, QubitSet::new()).unwrap())
            .unwrap();
        let rotations = circuit.basis_rotation_instructions();
        assert_eq!(rotations.len(), 2);
        assert!(rotations.iter().all(|i| i.as_gate() == Some(&Gate::H)));
    }

    #[test]
    fn test_adjoint_gradient_skips_mapping() {
        let mut circuit = Circuit::new();
        circuit
            .rx(FreeParameterExpression::parameter("theta"), q(0))
            .unwrap()
            .add_result_type(ResultType::expectation(Observable::PauliZ, q(0)).unwrap())
            .unwrap()
            .add_result_type(
                ResultType::adjoint_gradient(Observable::PauliX, q(0), vec![]).unwrap(),
            )
            .unwrap();
        assert!(circuit.observables_simultaneously_measurable());
        assert!(circuit.observable_mapping().observable_qubits().contains(q(0)));
    }

    #[test]
    fn test_parameters_and_binding() {
        let mut circuit = Circuit::new();
        circuit
            .rx(FreeParameterExpression::parameter("theta"), q(0))
            .unwrap()
            .ry(PI, q(0))
            .unwrap();
        assert_eq!(circuit.parameters().len(), 1);

        let mut values = FxHashMap::default();
        values.insert("theta".to_string(), 0.3);
        let bound = circuit.make_bound_circuit(&values, true).unwrap();
        assert!(bound.parameters().is_empty());
        assert_eq!(
            bound.instructions().next().and_then(Instruction::as_gate),
            Some(&Gate::Rx(FreeParameterExpression::number(0.3)))
        );

        values.insert("phi".to_string(), 1.0);
        assert!(matches!(
            circuit.make_bound_circuit(&values, true),
            Err(IrError::UnknownParameter(name)) if name == "phi"
        ));
        assert!(circuit.make_bound_circuit(&values, false).is_ok());
    }

    #[test]
    fn test_verbatim_box() {
        let mut inner = Circuit::new();
        inner.h(q(0)).unwrap().cnot(q(0), q(1)).unwrap();
        let mut circuit = Circuit::new();
        circuit.add_verbatim_box(&inner).unwrap();
        let ops: Vec<String> = circuit.instructions().map(|i| i.operator().name()).collect();
        assert_eq!(ops, vec!["start_verbatim_box", "h", "cnot", "end_verbatim_box"]);

        let mut with_results = Circuit::new();
        with_results
            .h(q(0))
            .unwrap()
            .add_result_type(ResultType::StateVector)
            .unwrap();
        assert!(circuit.add_verbatim_box(&with_results).is_err());
    }

    #[test]
    fn test_add_circuit_with_mapping() {
        let mut sub = Circuit::new();
        sub.cnot(q(0), q(1))
            .unwrap()
            .add_result_type(ResultType::probability(q(1)))
            .unwrap();
        let mut mapping = FxHashMap::default();
        mapping.insert(q(0), q(3));
        mapping.insert(q(1), q(4));

        let mut circuit = Circuit::new();
        circuit.add_circuit(&sub, Some(&mapping)).unwrap();
        let first = circuit.instructions().next().unwrap();
        assert_eq!(first.target().to_vec(), vec![q(3), q(4)]);
        assert_eq!(circuit.result_types(), &[ResultType::probability(q(4))]);
    }

    #[test]
    fn test_non_finite_angles_rejected() {
        let mut circuit = Circuit::new();
        assert!(matches!(
            circuit.rx(f64::NAN, q(0)),
            Err(IrError::NonFiniteAngle { .. })
        ));
        let scaled = FreeParameterExpression::parameter("theta")
            * FreeParameterExpression::number(f64::INFINITY);
        assert!(matches!(
            circuit.rz(scaled, q(0)),
            Err(IrError::NonFiniteAngle { .. })
        ));
        assert_eq!(circuit.instructions().count(), 0);

        circuit
            .rx(FreeParameterExpression::parameter("theta"), q(0))
            .unwrap();
        let mut values = FxHashMap::default();
        values.insert("theta".to_string(), f64::NEG_INFINITY);
        assert!(matches!(
            circuit.make_bound_circuit(&values, true),
            Err(IrError::NonFiniteAngle { gate, .. }) if gate == "rx"
        ));
    }

    #[test]
    fn test_equality() {
        let mut a = Circuit::new();
        a.h(q(0)).unwrap();
        let mut b = Circuit::new();
        b.h(q(0)).unwrap();
        assert_eq!(a, b);
        b.x(q(1)).unwrap();
        assert_ne!(a, b);
    }
}
