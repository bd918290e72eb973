//! Gate calibrations and their resolution against a circuit.
//!
//! A calibration maps a `(gate, target)` pair to the pulse sequence that
//! implements it. Calibrations whose gate parameters are free can serve any
//! literal instance of that gate: [`resolve_calibrations`] binds them to the
//! literal values found in the circuit and collects every frame, waveform
//! and fixed-argument calibration that needs declaring.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::instruction::{Instruction, Operator};
use crate::parameter::FreeParameter;
use crate::pulse::{register, Frame, PulseSequence, Waveform};
use crate::qubit::QubitSet;

/// Key of a calibration: a gate instance and the qubits it acts on.
///
/// Target equality is set-based; the recorded order is kept for emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalibrationKey {
    /// The calibrated gate, with literal or free parameters.
    pub gate: Gate,
    /// Target qubits.
    pub target: QubitSet,
}

impl CalibrationKey {
    /// Create a key.
    pub fn new(gate: Gate, target: impl Into<QubitSet>) -> Self {
        Self {
            gate,
            target: target.into(),
        }
    }
}

/// Pulse implementations of gates, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateCalibrations {
    pulse_sequences: IndexMap<CalibrationKey, PulseSequence>,
}

impl GateCalibrations {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a calibration, returning the one it replaced.
    pub fn insert(
        &mut self,
        gate: Gate,
        target: impl Into<QubitSet>,
        sequence: PulseSequence,
    ) -> Option<PulseSequence> {
        self.pulse_sequences
            .insert(CalibrationKey::new(gate, target), sequence)
    }

    /// The calibration for `(gate, target)`.
    pub fn get(&self, gate: &Gate, target: &QubitSet) -> Option<&PulseSequence> {
        self.pulse_sequences.get(&CalibrationKey {
            gate: gate.clone(),
            target: target.clone(),
        })
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&CalibrationKey, &PulseSequence)> {
        self.pulse_sequences.iter()
    }

    /// Number of calibrations.
    pub fn len(&self) -> usize {
        self.pulse_sequences.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.pulse_sequences.is_empty()
    }

    /// Calibrations restricted to the given gates and/or targets.
    #[must_use]
    pub fn filter(&self, gates: Option<&[Gate]>, targets: Option<&[QubitSet]>) -> Self {
        let pulse_sequences = self
            .pulse_sequences
            .iter()
            .filter(|(key, _)| gates.is_none_or(|g| g.contains(&key.gate)))
            .filter(|(key, _)| targets.is_none_or(|t| t.contains(&key.target)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { pulse_sequences }
    }
}

impl FromIterator<(CalibrationKey, PulseSequence)> for GateCalibrations {
    fn from_iter<I: IntoIterator<Item = (CalibrationKey, PulseSequence)>>(iter: I) -> Self {
        Self {
            pulse_sequences: iter.into_iter().collect(),
        }
    }
}

/// A calibration with only literal gate arguments, ready to declare.
#[derive(Debug, Clone, PartialEq)]
pub struct Defcal {
    /// The gate with numeric parameters.
    pub gate: Gate,
    /// Physical target qubits, in recorded order.
    pub target: QubitSet,
    /// Body of the calibration.
    pub sequence: PulseSequence,
}

/// Everything the calibration preamble declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationDeclarations {
    /// Frames that are not predefined on the device.
    pub frames: Vec<Frame>,
    /// All waveforms.
    pub waveforms: Vec<Waveform>,
    /// Fixed-argument calibrations.
    pub defcals: Vec<Defcal>,
    /// Free parameters referenced inside the declared calibrations.
    pub parameters: BTreeSet<FreeParameter>,
}

impl CalibrationDeclarations {
    /// Whether nothing needs declaring.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.waveforms.is_empty() && self.defcals.is_empty()
    }
}

/// Resolve `gate_definitions` against `instructions`.
///
/// Parametric calibrations matching a literal gate instruction (same gate
/// kind, same target set) are bound positionally to the instruction's
/// values and added as fixed-argument calibrations. An explicitly supplied
/// calibration for the same `(gate, target)` takes precedence over a
/// derived one. Returns `None` when nothing needs declaring.
///
/// # Errors
///
/// - [`IrError::PartiallyBoundCalibration`] when a matching calibration
///   fixes some but not all of its parameters.
/// - [`IrError::ParametricCalibrationOnParametricCircuit`] when both the
///   calibration and the instruction are parametric.
/// - [`IrError::NonUniqueResourceId`] when different frames or waveforms
///   share an id.
pub fn resolve_calibrations<'a>(
    instructions: impl IntoIterator<Item = &'a Instruction>,
    gate_definitions: &GateCalibrations,
) -> IrResult<Option<CalibrationDeclarations>> {
    let mut definitions = gate_definitions.clone();
    let mut frames: IndexMap<String, Frame> = IndexMap::new();
    let mut waveforms: IndexMap<String, Waveform> = IndexMap::new();

    for instruction in instructions {
        match instruction.operator() {
            Operator::PulseGate(pulse_gate) => {
                collect_resources(&pulse_gate.sequence, &mut frames, &mut waveforms)?;
            }
            Operator::Gate(gate) if gate.is_parameterizable() => {
                for (key, sequence) in fixed_argument_calibrations(gate_definitions, instruction)? {
                    if definitions.pulse_sequences.contains_key(&key) {
                        trace!(gate = key.gate.qasm_name(), "explicit calibration kept");
                        continue;
                    }
                    debug!(
                        gate = key.gate.qasm_name(),
                        target = %key.target,
                        "derived fixed-argument calibration"
                    );
                    definitions.pulse_sequences.insert(key, sequence);
                }
            }
            _ => {}
        }
    }

    for sequence in definitions.pulse_sequences.values() {
        collect_resources(sequence, &mut frames, &mut waveforms)?;
    }

    let mut declarations = CalibrationDeclarations {
        frames: frames.into_values().filter(|f| !f.is_predefined).collect(),
        waveforms: waveforms.into_values().collect(),
        ..Default::default()
    };
    for (key, sequence) in definitions.pulse_sequences {
        if key.gate.is_parameterized() {
            continue;
        }
        declarations.parameters.extend(sequence.parameters());
        declarations.defcals.push(Defcal {
            gate: key.gate,
            target: key.target,
            sequence,
        });
    }

    if declarations.is_empty() {
        return Ok(None);
    }
    Ok(Some(declarations))
}

fn collect_resources(
    sequence: &PulseSequence,
    frames: &mut IndexMap<String, Frame>,
    waveforms: &mut IndexMap<String, Waveform>,
) -> IrResult<()> {
    for frame in sequence.frames() {
        register(frames, "frame", &frame.id, frame)?;
    }
    for waveform in sequence.waveforms() {
        register(waveforms, "waveform", waveform.id(), waveform)?;
    }
    Ok(())
}

/// Bind every parametric calibration matching `instruction`.
fn fixed_argument_calibrations(
    gate_definitions: &GateCalibrations,
    instruction: &Instruction,
) -> IrResult<Vec<(CalibrationKey, PulseSequence)>> {
    let Some(gate) = instruction.as_gate() else {
        return Ok(vec![]);
    };
    let instruction_params = gate.parameters();
    let mut additional = Vec::new();

    for (key, calibration) in gate_definitions.iter() {
        if key.target != *instruction.target() || !key.gate.same_kind(gate) {
            continue;
        }
        let calibration_params = key.gate.parameters();
        if calibration_params.len() != instruction_params.len() {
            continue;
        }
        let free_count = calibration_params.iter().filter(|p| p.is_symbolic()).count();
        if free_count == 0 {
            continue;
        }
        if free_count < calibration_params.len() {
            return Err(IrError::PartiallyBoundCalibration);
        }
        if gate.is_parameterized() {
            return Err(IrError::ParametricCalibrationOnParametricCircuit);
        }

        let mut values = FxHashMap::default();
        for (param, value) in calibration_params.iter().zip(&instruction_params) {
            let name = param
                .as_parameter()
                .ok_or_else(|| IrError::UnsupportedCalibrationParameter(param.to_string()))?;
            let value = value
                .as_f64()
                .ok_or_else(|| IrError::UnboundParameter(value.to_string()))?;
            values.insert(name.name().to_string(), value);
        }
        additional.push((
            CalibrationKey {
                gate: gate.clone(),
                target: instruction.target().clone(),
            },
            calibration.bind(&values),
        ));
    }
    Ok(additional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::FreeParameterExpression as Expr;
    use crate::pulse::Port;
    use crate::qubit::Qubit;
    use num_complex::Complex64;

    fn frame() -> Frame {
        Frame::new("q0_rf", Port::new("rf0", 1e-9), 5e9, 0.0)
    }

    fn theta_sequence() -> PulseSequence {
        let mut seq = PulseSequence::new();
        seq.shift_phase(&frame(), Expr::parameter("theta")).unwrap();
        seq
    }

    fn rx(value: Expr) -> Instruction {
        Instruction::gate(Gate::Rx(value), &[Qubit(0)]).unwrap()
    }

    #[test]
    fn test_parametric_calibration_is_bound() {
        let mut defs = GateCalibrations::new();
        defs.insert(Gate::Rx(Expr::parameter("theta")), Qubit(0), theta_sequence());

        let decls = resolve_calibrations(&[rx(Expr::number(0.45))], &defs)
            .unwrap()
            .unwrap();
        assert_eq!(decls.defcals.len(), 1);
        assert_eq!(decls.defcals[0].gate, Gate::Rx(Expr::number(0.45)));
        assert!(decls.defcals[0].sequence.parameters().is_empty());
        assert!(decls.parameters.is_empty());
        assert_eq!(decls.frames, vec![frame()]);
        // The caller's table is untouched.
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn test_parametric_instruction_rejected() {
        let mut defs = GateCalibrations::new();
        defs.insert(Gate::Rx(Expr::parameter("theta")), Qubit(0), theta_sequence());
        let err = resolve_calibrations(&[rx(Expr::parameter("phi"))], &defs).unwrap_err();
        assert!(matches!(err, IrError::ParametricCalibrationOnParametricCircuit));
    }

    #[test]
    fn test_partial_binding_rejected() {
        let mut defs = GateCalibrations::new();
        defs.insert(
            Gate::PRx(Expr::parameter("theta"), Expr::number(0.1)),
            Qubit(0),
            theta_sequence(),
        );
        let instr =
            Instruction::gate(Gate::PRx(Expr::number(0.2), Expr::number(0.3)), &[Qubit(0)]).unwrap();
        let err = resolve_calibrations(&[instr], &defs).unwrap_err();
        assert!(matches!(err, IrError::PartiallyBoundCalibration));
    }

    #[test]
    fn test_explicit_calibration_wins() {
        let mut explicit = PulseSequence::new();
        explicit.set_phase(&frame(), 1.0).unwrap();
        let mut defs = GateCalibrations::new();
        defs.insert(Gate::Rx(Expr::parameter("theta")), Qubit(0), theta_sequence());
        defs.insert(Gate::Rx(Expr::number(0.45)), Qubit(0), explicit.clone());

        let decls = resolve_calibrations(&[rx(Expr::number(0.45))], &defs)
            .unwrap()
            .unwrap();
        assert_eq!(decls.defcals.len(), 1);
        assert_eq!(decls.defcals[0].sequence, explicit);
    }

    #[test]
    fn test_other_target_not_bound() {
        let mut defs = GateCalibrations::new();
        defs.insert(Gate::Rx(Expr::parameter("theta")), Qubit(1), theta_sequence());
        // Only the frame remains to declare; the parametric entry is skipped.
        let decls = resolve_calibrations(&[rx(Expr::number(0.45))], &defs)
            .unwrap()
            .unwrap();
        assert!(decls.defcals.is_empty());
        assert_eq!(decls.frames.len(), 1);
    }

    #[test]
    fn test_duplicate_waveform_id_rejected() {
        let a = Waveform::Constant {
            id: "wf".into(),
            length: Expr::number(1e-7),
            iq: Complex64::new(1.0, 0.0),
        };
        let b = Waveform::Constant {
            id: "wf".into(),
            length: Expr::number(2e-7),
            iq: Complex64::new(1.0, 0.0),
        };
        let mut seq_a = PulseSequence::new();
        seq_a.play(&frame(), &a).unwrap();
        let mut seq_b = PulseSequence::new();
        seq_b.play(&frame(), &b).unwrap();

        let mut defs = GateCalibrations::new();
        defs.insert(Gate::X, Qubit(0), seq_a);
        defs.insert(Gate::Y, Qubit(0), seq_b);
        let err = resolve_calibrations(std::iter::empty(), &defs).unwrap_err();
        assert!(matches!(
            err,
            IrError::NonUniqueResourceId {
                kind: "waveform",
                ..
            }
        ));
    }

    #[test]
    fn test_nothing_to_declare() {
        let predefined = Frame::predefined("q0_rf", Port::new("rf0", 1e-9), 5e9, 0.0);
        let mut seq = PulseSequence::new();
        seq.shift_phase(&predefined, Expr::parameter("theta")).unwrap();
        let mut defs = GateCalibrations::new();
        defs.insert(Gate::Rx(Expr::parameter("theta")), Qubit(0), seq);
        assert_eq!(resolve_calibrations(std::iter::empty(), &defs).unwrap(), None);
    }
}
