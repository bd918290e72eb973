//! Serialization of circuits to the supported intermediate representations.

use std::collections::BTreeMap;

use braq_ir::{Circuit, GateCalibrations, to_jaqcd};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::emitter::emit;
use crate::error::ParseResult;
use crate::parser::parse;

/// How qubits are referenced in emitted OpenQASM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QubitReferenceType {
    /// `q[i]` into a declared `qubit[n] q;` register.
    #[default]
    Virtual,
    /// `$i` hardware qubits, without a register declaration.
    Physical,
}

/// Options for OpenQASM serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationProperties {
    /// Qubit reference style.
    pub qubit_reference_type: QubitReferenceType,
}

/// Target representation for [`to_ir`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrType {
    /// OpenQASM 3 source text.
    OpenQasm,
    /// JAQCD JSON.
    Jaqcd,
}

/// An OpenQASM program together with its input values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenQasmProgram {
    /// The program text.
    pub source: String,
    /// Values for `input` declarations, if bound at submission.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, f64>,
}

/// A serialized circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "program")]
pub enum Program {
    /// OpenQASM 3.
    OpenQasm(OpenQasmProgram),
    /// JAQCD.
    Jaqcd(serde_json::Value),
}

impl Program {
    /// The OpenQASM program, if this is one.
    pub fn as_openqasm(&self) -> Option<&OpenQasmProgram> {
        match self {
            Program::OpenQasm(program) => Some(program),
            Program::Jaqcd(_) => None,
        }
    }

    /// The JAQCD document, if this is one.
    pub fn as_jaqcd(&self) -> Option<&serde_json::Value> {
        match self {
            Program::Jaqcd(value) => Some(value),
            Program::OpenQasm(_) => None,
        }
    }
}

/// Serialize `circuit` to `ir_type`.
///
/// `gate_definitions` only affects OpenQASM output, where matching
/// calibrations are declared in the program preamble.
///
/// # Errors
///
/// Calibration conflicts are reported as [`braq_ir::IrError`]s wrapped in
/// [`crate::ParseError::CircuitError`]; so is anything JAQCD cannot express.
#[instrument(skip_all, fields(ir_type = ?ir_type))]
pub fn to_ir(
    circuit: &Circuit,
    ir_type: IrType,
    properties: &SerializationProperties,
    gate_definitions: Option<&GateCalibrations>,
) -> ParseResult<Program> {
    match ir_type {
        IrType::OpenQasm => Ok(Program::OpenQasm(OpenQasmProgram {
            source: emit(circuit, properties, gate_definitions)?,
            inputs: BTreeMap::new(),
        })),
        IrType::Jaqcd => Ok(Program::Jaqcd(to_jaqcd(circuit)?)),
    }
}

/// Parse OpenQASM 3 source back into a circuit.
#[instrument(skip_all, fields(bytes = source.len()))]
pub fn from_ir(source: &str) -> ParseResult<Circuit> {
    parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use braq_ir::{Observable, Qubit, ResultType};

    #[test]
    fn test_properties_default_to_virtual() {
        let props: SerializationProperties = serde_json::from_str("{}").unwrap();
        assert_eq!(props.qubit_reference_type, QubitReferenceType::Virtual);

        let props: SerializationProperties =
            serde_json::from_str(r#"{"qubit_reference_type": "PHYSICAL"}"#).unwrap();
        assert_eq!(props.qubit_reference_type, QubitReferenceType::Physical);
    }

    #[test]
    fn test_to_ir_jaqcd() {
        let mut circuit = Circuit::new();
        circuit.h(Qubit(0)).unwrap();
        circuit
            .add_result_type(ResultType::expectation(Observable::PauliX, Qubit(0)).unwrap())
            .unwrap();

        let program = to_ir(
            &circuit,
            IrType::Jaqcd,
            &SerializationProperties::default(),
            None,
        )
        .unwrap();
        let jaqcd = program.as_jaqcd().unwrap();
        assert_eq!(jaqcd["instructions"][0]["type"], "h");
        assert_eq!(jaqcd["basis_rotation_instructions"][0]["type"], "h");
        assert!(program.as_openqasm().is_none());
    }

    #[test]
    fn test_openqasm_round_trip() {
        let mut circuit = Circuit::new();
        circuit.h(Qubit(0)).unwrap();
        circuit.cnot(Qubit(0), Qubit(1)).unwrap();
        circuit.measure(&[Qubit(1), Qubit(0)]).unwrap();

        let program = to_ir(
            &circuit,
            IrType::OpenQasm,
            &SerializationProperties::default(),
            None,
        )
        .unwrap();
        let source = &program.as_openqasm().unwrap().source;
        assert!(source.contains("b[0] = measure q[1];\nb[1] = measure q[0];\n"));
        assert_eq!(from_ir(source).unwrap(), circuit);
    }

    #[test]
    fn test_jaqcd_rejects_measure() {
        let mut circuit = Circuit::new();
        circuit.h(Qubit(0)).unwrap();
        circuit.measure(&[Qubit(0)]).unwrap();
        let result = to_ir(
            &circuit,
            IrType::Jaqcd,
            &SerializationProperties::default(),
            None,
        );
        assert!(matches!(
            result,
            Err(crate::ParseError::CircuitError(braq_ir::IrError::Unsupported { .. }))
        ));
    }
}
