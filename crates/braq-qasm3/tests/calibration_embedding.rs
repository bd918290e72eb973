//! Calibration preamble emission through `to_ir`.

use braq_ir::{
    Circuit, Frame, FreeParameterExpression as Expr, Gate, GateCalibrations, IrError, Port,
    PulseSequence, Qubit, Waveform,
};
use braq_qasm3::{IrType, ParseError, SerializationProperties, to_ir};
use num_complex::Complex64;

fn drive() -> Frame {
    Frame::new("q0_drive", Port::new("drive0", 1e-9), 4.5e9, 0.0)
}

fn square() -> Waveform {
    Waveform::Constant {
        id: "square".into(),
        length: Expr::number(4e-8),
        iq: Complex64::new(0.5, 0.0),
    }
}

fn qasm(circuit: &Circuit, calibrations: Option<&GateCalibrations>) -> Result<String, ParseError> {
    let program = to_ir(
        circuit,
        IrType::OpenQasm,
        &SerializationProperties::default(),
        calibrations,
    )?;
    Ok(program
        .as_openqasm()
        .expect("OpenQASM program")
        .source
        .clone())
}

fn rx_calibrations() -> GateCalibrations {
    let mut sequence = PulseSequence::new();
    sequence
        .shift_phase(&drive(), Expr::parameter("theta"))
        .unwrap()
        .play(&drive(), &square())
        .unwrap();
    let mut calibrations = GateCalibrations::new();
    calibrations.insert(Gate::Rx(Expr::parameter("theta")), Qubit(0), sequence);
    calibrations
}

#[test]
fn parametric_calibration_declared_for_literal_instruction() {
    let mut circuit = Circuit::new();
    circuit.rx(0.15, Qubit(0)).unwrap().h(Qubit(1)).unwrap();

    let source = qasm(&circuit, Some(&rx_calibrations())).unwrap();
    let expected_preamble = "\
cal {
    frame q0_drive = newframe(drive0, 4500000000.0, 0.0);
    waveform square = constant(4e-8s, 0.5 + 0.0im);
}
defcal rx(0.15) $0 {
    shift_phase(q0_drive, 0.15);
    play(q0_drive, square);
}
rx(0.15) q[0];
";
    assert!(source.contains(expected_preamble), "{source}");
    assert!(!source.contains("input float"));
}

#[test]
fn parametric_calibration_on_parametric_circuit_fails() {
    let mut circuit = Circuit::new();
    circuit.rx(Expr::parameter("phi"), Qubit(0)).unwrap();

    let err = qasm(&circuit, Some(&rx_calibrations())).unwrap_err();
    assert!(matches!(
        err,
        ParseError::CircuitError(IrError::ParametricCalibrationOnParametricCircuit)
    ));
}

#[test]
fn calibration_parameters_become_inputs() {
    let mut sequence = PulseSequence::new();
    sequence
        .shift_phase(&drive(), Expr::parameter("alpha"))
        .unwrap();
    let mut calibrations = GateCalibrations::new();
    calibrations.insert(Gate::H, Qubit(0), sequence);

    let mut circuit = Circuit::new();
    circuit.h(Qubit(0)).unwrap();
    let source = qasm(&circuit, Some(&calibrations)).unwrap();

    assert!(source.starts_with("OPENQASM 3.0;\ninput float alpha;\n"));
    assert!(source.contains("defcal h $0 {\n    shift_phase(q0_drive, alpha);\n}\n"));
    // The circuit itself is not modified.
    assert!(circuit.parameters().is_empty());
}

#[test]
fn predefined_frames_are_not_declared() {
    let predefined = Frame::predefined("q1_drive", Port::new("drive1", 1e-9), 5e9, 0.0);
    let mut sequence = PulseSequence::new();
    sequence.set_phase(&predefined, 0.5).unwrap();
    let mut calibrations = GateCalibrations::new();
    calibrations.insert(Gate::X, Qubit(1), sequence);

    let mut circuit = Circuit::new();
    circuit.x(Qubit(1)).unwrap();
    let source = qasm(&circuit, Some(&calibrations)).unwrap();

    assert!(!source.contains("newframe"));
    assert!(!source.contains("cal {"));
    assert!(source.contains("defcal x $1 {\n    set_phase(q1_drive, 0.5);\n}\n"));
}

#[test]
fn duplicate_waveform_ids_fail() {
    let other = Waveform::Gaussian {
        id: "square".into(),
        length: Expr::number(4e-8),
        sigma: Expr::number(1e-8),
        amplitude: Expr::number(0.3),
        zero_at_edges: false,
    };
    let mut sequence = PulseSequence::new();
    sequence.play(&drive(), &other).unwrap();
    let mut calibrations = rx_calibrations();
    calibrations.insert(Gate::X, Qubit(0), sequence);

    let mut circuit = Circuit::new();
    circuit.rx(0.15, Qubit(0)).unwrap();
    let err = qasm(&circuit, Some(&calibrations)).unwrap_err();
    assert!(matches!(
        err,
        ParseError::CircuitError(IrError::NonUniqueResourceId {
            kind: "waveform",
            ..
        })
    ));
}

#[test]
fn pulse_gate_emits_inline_cal_block() {
    let mut sequence = PulseSequence::new();
    sequence
        .play(&drive(), &square())
        .unwrap()
        .delay(&[drive()], Expr::parameter("wait"))
        .unwrap();

    let mut circuit = Circuit::new();
    circuit.pulse_gate(sequence, &[Qubit(0)]).unwrap();
    let source = qasm(&circuit, None).unwrap();

    assert!(source.starts_with("OPENQASM 3.0;\ninput float wait;\n"));
    // Resources used by pulse gates are declared without any calibrations.
    assert!(source.contains("waveform square = constant(4e-8s, 0.5 + 0.0im);"));
    assert!(source.contains("cal {\n    play(q0_drive, square);\n    delay[wait * 1s] q0_drive;\n}\n"));
}
