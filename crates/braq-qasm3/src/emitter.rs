//! QASM3 emitter for serializing circuits.

use std::collections::BTreeSet;

use braq_ir::{
    CalibrationDeclarations, Circuit, CompilerDirective, FreeParameter,
    FreeParameterExpression as Expr, Gate, GateCalibrations, Instruction, Matrix, Observable,
    Operator, PulseInstruction, Qubit, QubitSet, ResultType, Waveform, format_number,
    resolve_calibrations,
};
use num_complex::Complex64;
use tracing::{debug, trace};

use crate::error::ParseResult;
use crate::serialization::{QubitReferenceType, SerializationProperties};

/// Emit a circuit as QASM3 source code.
///
/// Calibrations matching the circuit's gates are declared in a preamble
/// ahead of the first instruction.
pub fn emit(
    circuit: &Circuit,
    properties: &SerializationProperties,
    gate_definitions: Option<&GateCalibrations>,
) -> ParseResult<String> {
    let mut emitter = Emitter::new(properties.qubit_reference_type);
    emitter.emit_circuit(circuit, gate_definitions)
}

/// Format calibration declarations as a `cal` block followed by `defcal`s.
///
/// Returns an empty string when there is nothing to declare.
pub fn emit_calibrations(declarations: &CalibrationDeclarations) -> String {
    let mut emitter = Emitter::new(QubitReferenceType::Physical);
    emitter.emit_calibration_declarations(declarations);
    emitter.output
}

/// QASM3 emitter.
struct Emitter {
    output: String,
    indent: usize,
    qubit_reference_type: QubitReferenceType,
}

impl Emitter {
    fn new(qubit_reference_type: QubitReferenceType) -> Self {
        Self {
            output: String::new(),
            indent: 0,
            qubit_reference_type,
        }
    }

    fn emit_circuit(
        &mut self,
        circuit: &Circuit,
        gate_definitions: Option<&GateCalibrations>,
    ) -> ParseResult<String> {
        debug!(
            instructions = circuit.instructions().count(),
            qubits = circuit.qubit_count(),
            "emitting OpenQASM"
        );
        let empty = GateCalibrations::new();
        let declarations =
            resolve_calibrations(circuit.instructions(), gate_definitions.unwrap_or(&empty))?;

        // Version
        self.writeln("OPENQASM 3.0;");

        // Inputs, including parameters used only inside calibrations
        let mut parameters: BTreeSet<FreeParameter> = circuit.parameters().clone();
        if let Some(declarations) = &declarations {
            if !declarations.parameters.is_empty() {
                debug!(
                    count = declarations.parameters.len(),
                    "folding calibration parameters into inputs"
                );
            }
            parameters.extend(declarations.parameters.iter().cloned());
        }
        for parameter in &parameters {
            self.writeln(&format!("input float {parameter};"));
        }

        // Classical bit declarations
        if circuit.result_types().is_empty() {
            let num_clbits = if circuit.measure_targets().is_empty() {
                circuit.qubit_count()
            } else {
                circuit.measure_targets().len()
            };
            if num_clbits > 0 {
                self.writeln(&format!("bit[{num_clbits}] b;"));
            }
        }

        // Qubit declarations
        if self.qubit_reference_type == QubitReferenceType::Virtual {
            if let Some(max) = circuit.qubits().max() {
                self.writeln(&format!("qubit[{}] q;", max.0 + 1));
            }
        }

        if let Some(declarations) = &declarations {
            self.emit_calibration_declarations(declarations);
        }

        // Instructions
        for instruction in circuit.instructions() {
            self.emit_instruction(instruction);
        }

        if !circuit.result_types().is_empty() {
            for result_type in circuit.result_types() {
                let pragma = self.emit_result_type(result_type);
                self.writeln(&format!("#pragma braket result {pragma}"));
            }
        } else if circuit.measure_targets().is_empty() {
            for (idx, qubit) in circuit.qubits().iter().enumerate() {
                let q = self.emit_qubit(qubit);
                self.writeln(&format!("b[{idx}] = measure {q};"));
            }
        }

        debug!(bytes = self.output.len(), "emitted OpenQASM");
        Ok(std::mem::take(&mut self.output))
    }

    // ====================================================================
    // Calibrations
    // ====================================================================

    fn emit_calibration_declarations(&mut self, declarations: &CalibrationDeclarations) {
        if !declarations.frames.is_empty() || !declarations.waveforms.is_empty() {
            self.writeln("cal {");
            self.indent += 1;
            for frame in &declarations.frames {
                self.writeln(&format!(
                    "frame {} = newframe({}, {}, {});",
                    frame.id,
                    frame.port.id,
                    format_number(frame.frequency),
                    format_number(frame.phase)
                ));
            }
            for waveform in &declarations.waveforms {
                let definition = emit_waveform(waveform);
                self.writeln(&format!("waveform {} = {definition};", waveform.id()));
            }
            self.indent -= 1;
            self.writeln("}");
        }

        for defcal in &declarations.defcals {
            trace!(gate = defcal.gate.qasm_name(), target = %defcal.target, "defcal");
            let head = gate_head(&defcal.gate);
            let targets = join(defcal.target.iter().map(|q| format!("${}", q.0)));
            self.writeln(&format!("defcal {head} {targets} {{"));
            self.indent += 1;
            for instruction in defcal.sequence.instructions() {
                self.emit_pulse_instruction(instruction);
            }
            self.indent -= 1;
            self.writeln("}");
        }
    }

    fn emit_pulse_instruction(&mut self, instruction: &PulseInstruction) {
        let line = match instruction {
            PulseInstruction::SetFrequency { frame, frequency } => {
                format!("set_frequency({frame}, {frequency});")
            }
            PulseInstruction::ShiftFrequency { frame, frequency } => {
                format!("shift_frequency({frame}, {frequency});")
            }
            PulseInstruction::SetPhase { frame, phase } => format!("set_phase({frame}, {phase});"),
            PulseInstruction::ShiftPhase { frame, phase } => {
                format!("shift_phase({frame}, {phase});")
            }
            PulseInstruction::SetScale { frame, scale } => format!("set_scale({frame}, {scale});"),
            PulseInstruction::Play { frame, waveform } => format!("play({frame}, {waveform});"),
            PulseInstruction::CaptureV0 { frame } => format!("capture_v0({frame});"),
            PulseInstruction::Delay { frames, duration } => {
                format!("delay[{}] {};", emit_duration(duration), frames.join(", "))
            }
            PulseInstruction::Barrier { frames } => format!("barrier {};", frames.join(", ")),
        };
        self.writeln(&line);
    }

    // ====================================================================
    // Instructions
    // ====================================================================

    fn emit_instruction(&mut self, instruction: &Instruction) {
        let qubits = self.emit_qubits(instruction.target());
        match instruction.operator() {
            Operator::Gate(Gate::Unitary(matrix)) => {
                self.writeln(&format!(
                    "#pragma braket unitary({}) {qubits}",
                    emit_matrix(matrix)
                ));
            }
            Operator::Gate(gate) => {
                self.writeln(&format!("{} {qubits};", gate_head(gate)));
            }
            Operator::Noise(noise) => {
                let params = join(noise.parameters().into_iter().map(format_number));
                self.writeln(&format!(
                    "#pragma braket noise {}({params}) {qubits}",
                    noise.qasm_name()
                ));
            }
            Operator::Measure { index } => {
                self.writeln(&format!("b[{index}] = measure {qubits};"));
            }
            Operator::CompilerDirective(CompilerDirective::StartVerbatimBox) => {
                self.writeln("#pragma braket verbatim");
                self.writeln("box{");
                self.indent += 1;
            }
            Operator::CompilerDirective(CompilerDirective::EndVerbatimBox) => {
                self.indent = self.indent.saturating_sub(1);
                self.writeln("}");
            }
            Operator::PulseGate(pulse_gate) => {
                self.writeln("cal {");
                self.indent += 1;
                for pulse in pulse_gate.sequence.instructions() {
                    self.emit_pulse_instruction(pulse);
                }
                self.indent -= 1;
                self.writeln("}");
            }
        }
    }

    // ====================================================================
    // Result types
    // ====================================================================

    fn emit_result_type(&self, result_type: &ResultType) -> String {
        match result_type {
            ResultType::Expectation { observable, target }
            | ResultType::Variance { observable, target }
            | ResultType::Sample { observable, target } => {
                format!(
                    "{} {}",
                    result_type.name(),
                    self.emit_observable(observable, target)
                )
            }
            ResultType::Probability { target } | ResultType::DensityMatrix { target } => {
                format!("{} {}", result_type.name(), self.emit_target(target))
            }
            ResultType::StateVector => "state_vector".into(),
            ResultType::Amplitude { states } => {
                format!(
                    "amplitude {}",
                    join(states.iter().map(|s| format!("\"{s}\"")))
                )
            }
            ResultType::AdjointGradient {
                observable,
                target,
                parameters,
            } => {
                let parameters = if parameters.is_empty() {
                    "all".to_string()
                } else {
                    join(parameters.iter().map(ToString::to_string))
                };
                format!(
                    "adjoint_gradient expectation({}) {parameters}",
                    self.emit_observable(observable, target)
                )
            }
        }
    }

    /// Format `x(q[0]) @ hermitian([[..]]) q[1], q[2]`, or `z all` for an
    /// empty target.
    fn emit_observable(&self, observable: &Observable, target: &QubitSet) -> String {
        let mut qubits = target.iter();
        let factors = observable.factors().iter().map(|factor| {
            let factor_target: Vec<Qubit> = qubits.by_ref().take(factor.qubit_count()).collect();
            let factor_target = if factor_target.is_empty() {
                "all".to_string()
            } else {
                join(factor_target.into_iter().map(|q| self.emit_qubit(q)))
            };
            match factor {
                Observable::Hermitian(h) => {
                    format!("hermitian({}) {factor_target}", emit_matrix(h.matrix()))
                }
                named if factor_target == "all" => format!("{} all", observable_name(named)),
                named => format!("{}({factor_target})", observable_name(named)),
            }
        });
        factors.collect::<Vec<_>>().join(" @ ")
    }

    fn emit_target(&self, target: &QubitSet) -> String {
        if target.is_empty() {
            "all".into()
        } else {
            self.emit_qubits(target)
        }
    }

    fn emit_qubits(&self, qubits: &QubitSet) -> String {
        join(qubits.iter().map(|q| self.emit_qubit(q)))
    }

    fn emit_qubit(&self, qubit: Qubit) -> String {
        match self.qubit_reference_type {
            QubitReferenceType::Virtual => format!("q[{}]", qubit.0),
            QubitReferenceType::Physical => format!("${}", qubit.0),
        }
    }

    fn writeln(&mut self, line: &str) {
        let indent = "    ".repeat(self.indent);
        self.output.push_str(&indent);
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

/// `name` or `name(arg, ...)`.
fn gate_head(gate: &Gate) -> String {
    let params = gate.parameters();
    if params.is_empty() {
        gate.qasm_name().to_string()
    } else {
        format!(
            "{}({})",
            gate.qasm_name(),
            join(params.iter().map(ToString::to_string))
        )
    }
}

fn observable_name(observable: &Observable) -> &'static str {
    match observable {
        Observable::Identity => "i",
        Observable::PauliX => "x",
        Observable::PauliY => "y",
        Observable::PauliZ => "z",
        Observable::Hadamard => "h",
        Observable::Hermitian(_) => "hermitian",
        Observable::TensorProduct(_) => "tensor_product",
    }
}

/// Format `a + bim`, keeping the sign of the imaginary part.
fn emit_complex(value: Complex64) -> String {
    if value.im.is_sign_negative() {
        format!("{:?} - {:?}im", value.re, value.im.abs())
    } else {
        format!("{:?} + {:?}im", value.re, value.im)
    }
}

fn emit_matrix(matrix: &Matrix) -> String {
    let rows = matrix
        .rows()
        .map(|row| format!("[{}]", join(row.iter().map(|c| emit_complex(*c)))));
    format!("[{}]", join(rows))
}

/// Durations are in seconds.
fn emit_duration(duration: &Expr) -> String {
    match duration.as_f64() {
        Some(seconds) => format!("{}s", format_number(seconds)),
        None => format!("{duration} * 1s"),
    }
}

fn emit_waveform(waveform: &Waveform) -> String {
    match waveform {
        Waveform::Arbitrary { amplitudes, .. } => {
            format!("{{{}}}", join(amplitudes.iter().map(|c| emit_complex(*c))))
        }
        Waveform::Constant { length, iq, .. } => {
            format!("constant({}, {})", emit_duration(length), emit_complex(*iq))
        }
        Waveform::Gaussian {
            length,
            sigma,
            amplitude,
            zero_at_edges,
            ..
        } => format!(
            "gaussian({}, {}, {amplitude}, {zero_at_edges})",
            emit_duration(length),
            emit_duration(sigma)
        ),
        Waveform::DragGaussian {
            length,
            sigma,
            beta,
            amplitude,
            zero_at_edges,
            ..
        } => format!(
            "drag_gaussian({}, {}, {beta}, {amplitude}, {zero_at_edges})",
            emit_duration(length),
            emit_duration(sigma)
        ),
    }
}
