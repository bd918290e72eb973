//! Abstract Syntax Tree for the Braket dialect of `OpenQASM` 3.

use serde::{Deserialize, Serialize};

/// A complete QASM3 program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// QASM version (e.g., "3.0").
    pub version: String,
    /// Statements in the program.
    pub statements: Vec<Statement>,
}

/// A statement in a QASM3 program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// Include statement.
    Include(String),

    /// Parameter declaration: `input float name;`
    InputDecl { name: String },

    /// Qubit declaration: `qubit[n] name;` or `qubit name;`
    QubitDecl { name: String, size: Option<u32> },

    /// Classical bit declaration: `bit[n] name;` or `bit name;`
    BitDecl { name: String, size: Option<u32> },

    /// Gate application.
    Gate(GateCall),

    /// Measurement: `measure q -> b;` or `b = measure q;`
    Measure {
        qubits: Vec<QubitRef>,
        bits: Vec<BitRef>,
    },

    /// A `#pragma` line.
    Pragma(Pragma),

    /// A `box { ... }` block.
    Box(Vec<Statement>),
}

/// A gate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name.
    pub name: String,
    /// Gate parameters (angles, etc.).
    pub params: Vec<Expression>,
    /// Qubits the gate acts on.
    pub qubits: Vec<QubitRef>,
}

/// Reference to a qubit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QubitRef {
    /// Virtual qubit: `q` (entire register) or `q[i]` (single element).
    Single {
        register: String,
        index: Option<u32>,
    },
    /// Physical qubit: `$i`.
    Physical(u32),
}

impl QubitRef {
    /// Create a reference to a single qubit.
    pub fn single(register: impl Into<String>, index: u32) -> Self {
        QubitRef::Single {
            register: register.into(),
            index: Some(index),
        }
    }

    /// Create a reference to an entire register.
    pub fn register(register: impl Into<String>) -> Self {
        QubitRef::Single {
            register: register.into(),
            index: None,
        }
    }
}

/// Reference to a classical bit or bit register element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitRef {
    pub register: String,
    pub index: Option<u32>,
}

/// Qubits a pragma applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PragmaTarget {
    /// `all`: every qubit of the circuit.
    All,
    /// An explicit list.
    Qubits(Vec<QubitRef>),
}

/// A `#pragma` directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Pragma {
    /// `#pragma braket verbatim`; applies to the following `box`.
    Verbatim,
    /// `#pragma braket unitary([[...]]) q[0]`
    Unitary {
        matrix: Vec<Vec<Expression>>,
        qubits: Vec<QubitRef>,
    },
    /// `#pragma braket noise bit_flip(0.1) q[0]`
    Noise {
        name: String,
        params: Vec<Expression>,
        qubits: Vec<QubitRef>,
    },
    /// `#pragma braket result ...`
    Result(ResultPragma),
    /// Any pragma outside the `braket` namespace, kept verbatim.
    Other(String),
}

/// Observable-based result kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservableResultKind {
    Expectation,
    Variance,
    Sample,
}

/// The body of a `#pragma braket result` line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResultPragma {
    /// `expectation x(q[0]) @ y(q[1])`, `variance z all`, ...
    Observable {
        kind: ObservableResultKind,
        factors: Vec<ObservableFactor>,
    },
    /// `probability q[0], q[1]` or `probability all`
    Probability(PragmaTarget),
    /// `density_matrix q[0]` or `density_matrix all`
    DensityMatrix(PragmaTarget),
    /// `state_vector`
    StateVector,
    /// `amplitude "00", "11"`
    Amplitude(Vec<String>),
    /// `adjoint_gradient expectation(z(q[0])) theta, phi` or `... all`
    AdjointGradient {
        factors: Vec<ObservableFactor>,
        parameters: Vec<String>,
    },
}

/// One factor of an observable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservableFactor {
    /// What is measured.
    pub kind: ObservableFactorKind,
    /// Qubits the factor acts on.
    pub target: PragmaTarget,
}

/// Named or matrix-defined observable factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObservableFactorKind {
    /// `i`, `x`, `y`, `z` or `h`.
    Named(String),
    /// `hermitian([[...]])`
    Hermitian(Vec<Vec<Expression>>),
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Imaginary literal; holds the coefficient of `im`.
    Imag(f64),
    /// Identifier.
    Identifier(String),
    /// Pi constant.
    Pi,
    /// Tau constant (2π).
    Tau,
    /// Euler's number.
    Euler,
    /// Negation.
    Neg(Box<Expression>),
    /// Binary operation.
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    /// Parenthesized expression.
    Paren(Box<Expression>),
}

impl Expression {
    /// Try to evaluate as a constant f64.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Expression::Int(v) => Some(*v as f64),
            Expression::Float(v) => Some(*v),
            Expression::Pi => Some(std::f64::consts::PI),
            Expression::Tau => Some(std::f64::consts::TAU),
            Expression::Euler => Some(std::f64::consts::E),
            Expression::Neg(e) => e.as_f64().map(|v| -v),
            Expression::BinOp { left, op, right } => {
                let l = left.as_f64()?;
                let r = right.as_f64()?;
                Some(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                })
            }
            Expression::Paren(e) => e.as_f64(),
            Expression::Imag(_) | Expression::Identifier(_) => None,
        }
    }

    /// Whether the expression mentions no identifiers.
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Identifier(_) => false,
            Expression::Neg(e) | Expression::Paren(e) => e.is_constant(),
            Expression::BinOp { left, right, .. } => left.is_constant() && right.is_constant(),
            _ => true,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}
