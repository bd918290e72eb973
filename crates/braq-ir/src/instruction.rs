//! Circuit instructions combining operators with targets.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::noise::Noise;
use crate::parameter::FreeParameter;
use crate::pulse::PulseSequence;
use crate::qubit::{Qubit, QubitSet};

/// Directives to the compiler that do not act on the quantum state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompilerDirective {
    /// Start of a block the compiler must run verbatim.
    StartVerbatimBox,
    /// End of a verbatim block.
    EndVerbatimBox,
}

/// A gate implemented directly by a pulse sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseGate {
    /// The pulse program.
    pub sequence: PulseSequence,
    /// Number of qubits the gate acts on.
    pub qubit_count: usize,
}

/// What an instruction does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    /// A quantum gate.
    Gate(Gate),
    /// A noise channel.
    Noise(Noise),
    /// Measurement into classical bit `index`.
    Measure {
        /// Classical bit index.
        index: usize,
    },
    /// A compiler directive.
    CompilerDirective(CompilerDirective),
    /// A pulse-level gate.
    PulseGate(PulseGate),
}

impl Operator {
    /// Name used in error messages and logs.
    pub fn name(&self) -> String {
        match self {
            Operator::Gate(g) => g.qasm_name().to_string(),
            Operator::Noise(n) => n.qasm_name().to_string(),
            Operator::Measure { .. } => "measure".to_string(),
            Operator::CompilerDirective(CompilerDirective::StartVerbatimBox) => {
                "start_verbatim_box".to_string()
            }
            Operator::CompilerDirective(CompilerDirective::EndVerbatimBox) => {
                "end_verbatim_box".to_string()
            }
            Operator::PulseGate(_) => "pulse_gate".to_string(),
        }
    }

    /// Number of target qubits, or `None` when any number is accepted.
    pub fn qubit_count(&self) -> Option<usize> {
        match self {
            Operator::Gate(g) => Some(g.qubit_count()),
            Operator::Noise(n) => Some(n.qubit_count()),
            Operator::Measure { .. } => Some(1),
            Operator::CompilerDirective(_) => None,
            Operator::PulseGate(p) => Some(p.qubit_count),
        }
    }

    /// Free parameters used by the operator.
    pub fn free_parameters(&self) -> BTreeSet<FreeParameter> {
        match self {
            Operator::Gate(g) => g.free_parameters(),
            Operator::PulseGate(p) => p.sequence.parameters(),
            _ => BTreeSet::new(),
        }
    }

    /// Substitute parameter values.
    #[must_use]
    pub fn bind(&self, values: &FxHashMap<String, f64>) -> Operator {
        match self {
            Operator::Gate(g) => Operator::Gate(g.bind(values)),
            Operator::PulseGate(p) => Operator::PulseGate(PulseGate {
                sequence: p.sequence.bind(values),
                qubit_count: p.qubit_count,
            }),
            _ => self.clone(),
        }
    }
}

/// An operator applied to a set of qubits.
///
/// Unlike [`QubitSet`], instruction equality is order-sensitive:
/// `cnot q[0], q[1]` and `cnot q[1], q[0]` differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    operator: Operator,
    target: QubitSet,
}

impl Instruction {
    /// Create an instruction, checking the target size and duplicates.
    pub fn new(operator: Operator, target: &[Qubit]) -> IrResult<Self> {
        if let Some(expected) = operator.qubit_count() {
            if expected != target.len() {
                return Err(IrError::QubitCountMismatch {
                    name: operator.name(),
                    expected,
                    got: target.len(),
                });
            }
        }
        let mut set = QubitSet::new();
        for &q in target {
            if !set.insert(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: q,
                    gate_name: Some(operator.name()),
                });
            }
        }
        Ok(Self {
            operator,
            target: set,
        })
    }

    /// Create a gate instruction.
    pub fn gate(gate: Gate, target: &[Qubit]) -> IrResult<Self> {
        Self::new(Operator::Gate(gate), target)
    }

    /// The operator.
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// The target qubits, in order.
    pub fn target(&self) -> &QubitSet {
        &self.target
    }

    /// The gate, if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.operator {
            Operator::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Copy with every target qubit passed through `mapping`; unmapped
    /// qubits are kept.
    pub fn remapped(&self, mapping: &FxHashMap<Qubit, Qubit>) -> IrResult<Self> {
        let target: Vec<Qubit> = self
            .target
            .iter()
            .map(|q| mapping.get(&q).copied().unwrap_or(q))
            .collect();
        Self::new(self.operator.clone(), &target)
    }

    /// Copy with a different operator on the same target.
    #[must_use]
    pub fn with_operator(&self, operator: Operator) -> Self {
        Self {
            operator,
            target: self.target.clone(),
        }
    }
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator && self.target.iter().eq(other.target.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_count_checked() {
        let err = Instruction::gate(Gate::CNot, &[Qubit(0)]).unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_qubit_rejected() {
        let err = Instruction::gate(Gate::CZ, &[Qubit(1), Qubit(1)]).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { qubit: Qubit(1), .. }));
    }

    #[test]
    fn test_directive_accepts_any_target() {
        let instr = Instruction::new(
            Operator::CompilerDirective(CompilerDirective::StartVerbatimBox),
            &[],
        )
        .unwrap();
        assert!(instr.target().is_empty());
    }

    #[test]
    fn test_remapped() {
        let instr = Instruction::gate(Gate::CNot, &[Qubit(0), Qubit(1)]).unwrap();
        let mut mapping = FxHashMap::default();
        mapping.insert(Qubit(0), Qubit(5));
        let moved = instr.remapped(&mapping).unwrap();
        assert_eq!(moved.target().to_vec(), vec![Qubit(5), Qubit(1)]);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = Instruction::gate(Gate::CNot, &[Qubit(0), Qubit(1)]).unwrap();
        let b = Instruction::gate(Gate::CNot, &[Qubit(1), Qubit(0)]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.target(), b.target());
    }
}
