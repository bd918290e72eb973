//! Quantum gate types.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;
use crate::parameter::{FreeParameter, FreeParameterExpression as Expr};

/// Gates of the Braket gate set.
///
/// Gates hash and compare by value (floats bitwise), so a gate together
/// with its target can key a calibration table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    // Single-qubit gates
    /// Identity gate.
    I,
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Si,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Ti,
    /// V gate (sqrt(X)).
    V,
    /// V-dagger gate.
    Vi,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(Expr),
    /// Rotation around Y axis.
    Ry(Expr),
    /// Rotation around Z axis.
    Rz(Expr),
    /// Phase shift.
    PhaseShift(Expr),
    /// IonQ GPi gate.
    GPi(Expr),
    /// IonQ GPi2 gate.
    GPi2(Expr),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(Expr, Expr, Expr),
    /// Phased RX gate PRx(θ, φ).
    PRx(Expr, Expr),

    // Two-qubit gates
    /// Controlled-NOT gate.
    CNot,
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Echoed cross-resonance gate.
    ECR,
    /// Controlled sqrt(X) gate.
    CV,
    /// Controlled phase shift.
    CPhaseShift(Expr),
    /// Controlled phase shift on |00⟩.
    CPhaseShift00(Expr),
    /// Controlled phase shift on |01⟩.
    CPhaseShift01(Expr),
    /// Controlled phase shift on |10⟩.
    CPhaseShift10(Expr),
    /// Ising XX coupling.
    XX(Expr),
    /// Ising YY coupling.
    YY(Expr),
    /// Ising ZZ coupling.
    ZZ(Expr),
    /// XY coupling.
    XY(Expr),
    /// Parametrized SWAP.
    PSwap(Expr),
    /// IonQ Mølmer-Sørensen gate MS(φ0, φ1, θ).
    MS(Expr, Expr, Expr),

    // Three-qubit gates
    /// Toffoli gate.
    CCNot,
    /// Fredkin gate.
    CSwap,

    /// Arbitrary unitary.
    Unitary(Matrix),
}

impl Gate {
    /// Canonical OpenQASM name.
    pub fn qasm_name(&self) -> &'static str {
        match self {
            Gate::I => "i",
            Gate::H => "h",
            Gate::X => "x",
            Gate::Y => "y",
            Gate::Z => "z",
            Gate::S => "s",
            Gate::Si => "si",
            Gate::T => "t",
            Gate::Ti => "ti",
            Gate::V => "v",
            Gate::Vi => "vi",
            Gate::Rx(_) => "rx",
            Gate::Ry(_) => "ry",
            Gate::Rz(_) => "rz",
            Gate::PhaseShift(_) => "phaseshift",
            Gate::GPi(_) => "gpi",
            Gate::GPi2(_) => "gpi2",
            Gate::U(..) => "U",
            Gate::PRx(..) => "prx",
            Gate::CNot => "cnot",
            Gate::Swap => "swap",
            Gate::ISwap => "iswap",
            Gate::CY => "cy",
            Gate::CZ => "cz",
            Gate::ECR => "ecr",
            Gate::CV => "cv",
            Gate::CPhaseShift(_) => "cphaseshift",
            Gate::CPhaseShift00(_) => "cphaseshift00",
            Gate::CPhaseShift01(_) => "cphaseshift01",
            Gate::CPhaseShift10(_) => "cphaseshift10",
            Gate::XX(_) => "xx",
            Gate::YY(_) => "yy",
            Gate::ZZ(_) => "zz",
            Gate::XY(_) => "xy",
            Gate::PSwap(_) => "pswap",
            Gate::MS(..) => "ms",
            Gate::CCNot => "ccnot",
            Gate::CSwap => "cswap",
            Gate::Unitary(_) => "unitary",
        }
    }

    /// Number of qubits the gate acts on.
    pub fn qubit_count(&self) -> usize {
        match self {
            Gate::I
            | Gate::H
            | Gate::X
            | Gate::Y
            | Gate::Z
            | Gate::S
            | Gate::Si
            | Gate::T
            | Gate::Ti
            | Gate::V
            | Gate::Vi
            | Gate::Rx(_)
            | Gate::Ry(_)
            | Gate::Rz(_)
            | Gate::PhaseShift(_)
            | Gate::GPi(_)
            | Gate::GPi2(_)
            | Gate::U(..)
            | Gate::PRx(..) => 1,

            Gate::CNot
            | Gate::Swap
            | Gate::ISwap
            | Gate::CY
            | Gate::CZ
            | Gate::ECR
            | Gate::CV
            | Gate::CPhaseShift(_)
            | Gate::CPhaseShift00(_)
            | Gate::CPhaseShift01(_)
            | Gate::CPhaseShift10(_)
            | Gate::XX(_)
            | Gate::YY(_)
            | Gate::ZZ(_)
            | Gate::XY(_)
            | Gate::PSwap(_)
            | Gate::MS(..) => 2,

            Gate::CCNot | Gate::CSwap => 3,

            Gate::Unitary(m) => m.qubit_count(),
        }
    }

    /// Ordered gate parameters; empty for fixed gates.
    pub fn parameters(&self) -> Vec<&Expr> {
        match self {
            Gate::Rx(p)
            | Gate::Ry(p)
            | Gate::Rz(p)
            | Gate::PhaseShift(p)
            | Gate::GPi(p)
            | Gate::GPi2(p)
            | Gate::CPhaseShift(p)
            | Gate::CPhaseShift00(p)
            | Gate::CPhaseShift01(p)
            | Gate::CPhaseShift10(p)
            | Gate::XX(p)
            | Gate::YY(p)
            | Gate::ZZ(p)
            | Gate::XY(p)
            | Gate::PSwap(p) => vec![p],

            Gate::PRx(a, b) => vec![a, b],

            Gate::U(a, b, c) | Gate::MS(a, b, c) => vec![a, b, c],

            _ => vec![],
        }
    }

    /// Whether any parameter is still symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Whether the gate accepts parameters at all.
    pub fn is_parameterizable(&self) -> bool {
        !self.parameters().is_empty()
    }

    /// Whether `other` is the same kind of gate, regardless of arguments.
    pub fn same_kind(&self, other: &Gate) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Rebuild the gate with each parameter passed through `f`.
    #[must_use]
    pub fn map_parameters(&self, mut f: impl FnMut(&Expr) -> Expr) -> Gate {
        match self {
            Gate::Rx(p) => Gate::Rx(f(p)),
            Gate::Ry(p) => Gate::Ry(f(p)),
            Gate::Rz(p) => Gate::Rz(f(p)),
            Gate::PhaseShift(p) => Gate::PhaseShift(f(p)),
            Gate::GPi(p) => Gate::GPi(f(p)),
            Gate::GPi2(p) => Gate::GPi2(f(p)),
            Gate::CPhaseShift(p) => Gate::CPhaseShift(f(p)),
            Gate::CPhaseShift00(p) => Gate::CPhaseShift00(f(p)),
            Gate::CPhaseShift01(p) => Gate::CPhaseShift01(f(p)),
            Gate::CPhaseShift10(p) => Gate::CPhaseShift10(f(p)),
            Gate::XX(p) => Gate::XX(f(p)),
            Gate::YY(p) => Gate::YY(f(p)),
            Gate::ZZ(p) => Gate::ZZ(f(p)),
            Gate::XY(p) => Gate::XY(f(p)),
            Gate::PSwap(p) => Gate::PSwap(f(p)),
            Gate::PRx(a, b) => Gate::PRx(f(a), f(b)),
            Gate::U(a, b, c) => Gate::U(f(a), f(b), f(c)),
            Gate::MS(a, b, c) => Gate::MS(f(a), f(b), f(c)),
            _ => self.clone(),
        }
    }

    /// Substitute parameter values.
    #[must_use]
    pub fn bind(&self, values: &FxHashMap<String, f64>) -> Gate {
        self.map_parameters(|p| p.subs(values))
    }

    /// Free parameters used by the gate.
    pub fn free_parameters(&self) -> std::collections::BTreeSet<FreeParameter> {
        let mut set = std::collections::BTreeSet::new();
        for p in self.parameters() {
            p.collect_parameters(&mut set);
        }
        set
    }

    /// Look up a gate by OpenQASM name.
    ///
    /// Returns `None` for unknown names or a wrong number of parameters.
    /// Unitaries are not nameable here since they carry a matrix.
    pub fn from_qasm_name(name: &str, params: &[Expr]) -> Option<Gate> {
        let one = |g: fn(Expr) -> Gate| match params {
            [p] => Some(g(p.clone())),
            _ => None,
        };
        let fixed = |g: Gate| params.is_empty().then_some(g);
        match name {
            "i" => fixed(Gate::I),
            "h" => fixed(Gate::H),
            "x" => fixed(Gate::X),
            "y" => fixed(Gate::Y),
            "z" => fixed(Gate::Z),
            "s" => fixed(Gate::S),
            "si" => fixed(Gate::Si),
            "t" => fixed(Gate::T),
            "ti" => fixed(Gate::Ti),
            "v" => fixed(Gate::V),
            "vi" => fixed(Gate::Vi),
            "rx" => one(Gate::Rx),
            "ry" => one(Gate::Ry),
            "rz" => one(Gate::Rz),
            "phaseshift" => one(Gate::PhaseShift),
            "gpi" => one(Gate::GPi),
            "gpi2" => one(Gate::GPi2),
            "U" => match params {
                [a, b, c] => Some(Gate::U(a.clone(), b.clone(), c.clone())),
                _ => None,
            },
            "prx" => match params {
                [a, b] => Some(Gate::PRx(a.clone(), b.clone())),
                _ => None,
            },
            "cnot" => fixed(Gate::CNot),
            "swap" => fixed(Gate::Swap),
            "iswap" => fixed(Gate::ISwap),
            "cy" => fixed(Gate::CY),
            "cz" => fixed(Gate::CZ),
            "ecr" => fixed(Gate::ECR),
            "cv" => fixed(Gate::CV),
            "cphaseshift" => one(Gate::CPhaseShift),
            "cphaseshift00" => one(Gate::CPhaseShift00),
            "cphaseshift01" => one(Gate::CPhaseShift01),
            "cphaseshift10" => one(Gate::CPhaseShift10),
            "xx" => one(Gate::XX),
            "yy" => one(Gate::YY),
            "zz" => one(Gate::ZZ),
            "xy" => one(Gate::XY),
            "pswap" => one(Gate::PSwap),
            "ms" => match params {
                [a, b, c] => Some(Gate::MS(a.clone(), b.clone(), c.clone())),
                _ => None,
            },
            "ccnot" => fixed(Gate::CCNot),
            "cswap" => fixed(Gate::CSwap),
            _ => None,
        }
    }
}
