//! `OpenQASM` 3 Serialization for Braq Circuits
//!
//! This crate turns [`braq_ir::Circuit`]s into the Braket dialect of
//! `OpenQASM` 3.0, including the calibration preamble for pulse-level gate
//! definitions, and parses that dialect back into circuits.
//!
//! # Supported Features
//!
//! | Feature | Emit | Parse | Example |
//! |---------|------|-------|---------|
//! | Version declaration | ✅ | ✅ | `OPENQASM 3.0;` |
//! | Free parameters | ✅ | ✅ | `input float theta;` |
//! | Virtual qubits | ✅ | ✅ | `qubit[2] q;`, `h q[0];` |
//! | Physical qubits | ✅ | ✅ | `h $0;` |
//! | Measurements | ✅ | ✅ | `b[0] = measure q[0];` |
//! | Result types | ✅ | ✅ | `#pragma braket result expectation z(q[0])` |
//! | Noise channels | ✅ | ✅ | `#pragma braket noise bit_flip(0.1) q[0]` |
//! | Unitary gates | ✅ | ✅ | `#pragma braket unitary([[0, 1.0im], [-1.0im, 0]]) q[0]` |
//! | Verbatim boxes | ✅ | ✅ | `#pragma braket verbatim` + `box{ ... }` |
//! | Calibrations | ✅ | ❌ | `cal { ... }`, `defcal rx(0.5) $0 { ... }` |
//!
//! # Example: Emitting QASM
//!
//! ```rust
//! use braq_ir::{Circuit, Qubit};
//! use braq_qasm3::{IrType, SerializationProperties, to_ir};
//!
//! let mut circuit = Circuit::new();
//! circuit.h(Qubit(0)).unwrap();
//! circuit.cnot(Qubit(0), Qubit(1)).unwrap();
//!
//! let program = to_ir(&circuit, IrType::OpenQasm, &SerializationProperties::default(), None)
//!     .unwrap();
//! let source = &program.as_openqasm().unwrap().source;
//! assert!(source.starts_with("OPENQASM 3.0;\nbit[2] b;\nqubit[2] q;\n"));
//! assert!(source.contains("cnot q[0], q[1];"));
//! // Unmeasured circuits without result types measure every qubit.
//! assert!(source.ends_with("b[1] = measure q[1];\n"));
//! ```
//!
//! # Example: Round-Trip
//!
//! ```rust
//! use braq_qasm3::{IrType, SerializationProperties, from_ir, to_ir};
//!
//! let original = r#"
//! OPENQASM 3.0;
//! input float theta;
//! qubit[2] q;
//! rx(theta) q[0];
//! cnot q[0], q[1];
//! #pragma braket result expectation z(q[0]) @ z(q[1])
//! "#;
//!
//! // Parse → Circuit → Emit
//! let circuit = from_ir(original).unwrap();
//! let program = to_ir(&circuit, IrType::OpenQasm, &SerializationProperties::default(), None)
//!     .unwrap();
//!
//! // Parse again to verify
//! let reparsed = from_ir(&program.as_openqasm().unwrap().source).unwrap();
//! assert_eq!(circuit, reparsed);
//! assert_eq!(reparsed.parameters().len(), 1);
//! ```

mod ast;
mod emitter;
mod error;
mod lexer;
mod parser;
mod serialization;

pub use emitter::{emit, emit_calibrations};
pub use error::{ParseError, ParseResult};
pub use parser::{parse, parse_ast};
pub use serialization::{
    IrType, OpenQasmProgram, Program, QubitReferenceType, SerializationProperties, from_ir, to_ir,
};

// Re-export AST types for advanced users
pub mod syntax {
    pub use crate::ast::*;
}
