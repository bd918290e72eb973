//! Error types for OpenQASM serialization and parsing.

use thiserror::Error;

/// Errors that can occur while reading or writing OpenQASM.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("Lexer error at position {position}: {message}")]
    LexerError { position: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// Invalid version.
    #[error("Invalid OPENQASM version: {0}")]
    InvalidVersion(String),

    /// Undefined identifier.
    #[error("Undefined identifier: {0}")]
    UndefinedIdentifier(String),

    /// Duplicate declaration.
    #[error("Duplicate declaration: {0}")]
    DuplicateDeclaration(String),

    /// Unknown gate, or a known gate with the wrong number of arguments.
    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    /// Unknown noise channel, or a known one with the wrong number of arguments.
    #[error("Unknown noise channel: {0}")]
    UnknownNoise(String),

    /// Unknown observable name.
    #[error("Unknown observable: {0}")]
    UnknownObservable(String),

    /// Index out of bounds.
    #[error("Index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        register: String,
        index: usize,
        size: usize,
    },

    /// A language construct the circuit model cannot represent.
    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    /// IR error during circuit construction.
    #[error("Circuit error: {0}")]
    CircuitError(#[from] braq_ir::IrError),

    /// Generic parse error.
    #[error("Parse error: {0}")]
    Generic(String),
}

/// Result type for parsing and serialization operations.
pub type ParseResult<T> = Result<T, ParseError>;
