//! Time-ordered instruction grid.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::instruction::{Instruction, Operator};
use crate::qubit::{Qubit, QubitSet};

/// The kind of slot an instruction occupies in a moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MomentType {
    /// A gate or pulse gate.
    Gate,
    /// A noise channel attached after a gate.
    GateNoise,
    /// A compiler directive spanning every qubit.
    CompilerDirective,
    /// A measurement.
    Measure,
}

/// Key of a moment slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MomentsKey {
    /// Time step.
    pub time: usize,
    /// Qubits the slot covers; empty for directives.
    pub qubits: QubitSet,
    /// Slot kind.
    pub moment_type: MomentType,
    /// Disambiguates several noise channels on the same qubits and time.
    pub noise_index: usize,
}

/// Instructions arranged by time step.
///
/// Gates take the step after the latest step of their qubits, noise shares
/// the step of the last gate on its qubits, directives synchronize every
/// qubit, and measurements go after everything already placed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Moments {
    moments: IndexMap<MomentsKey, Instruction>,
    /// Number of occupied steps per qubit (last step + 1).
    max_times: FxHashMap<Qubit, usize>,
    /// Steps consumed by directives spanning all qubits.
    time_all_qubits: usize,
    qubits: QubitSet,
    depth: usize,
}

impl Moments {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an instruction.
    pub fn add(&mut self, instruction: Instruction) {
        match instruction.operator() {
            Operator::CompilerDirective(_) => {
                let all: Vec<Qubit> = self.qubits.to_vec();
                let time = self.update_qubit_times(&all);
                self.time_all_qubits = time + 1;
                self.insert(time, QubitSet::new(), MomentType::CompilerDirective, instruction);
            }
            Operator::Noise(_) => {
                let qubits = instruction.target().clone();
                let time = qubits
                    .iter()
                    .map(|q| self.max_times.get(&q).copied().unwrap_or(0).saturating_sub(1))
                    .max()
                    .unwrap_or(0);
                self.qubits.extend(qubits.iter());
                self.insert(time, qubits, MomentType::GateNoise, instruction);
            }
            Operator::Measure { .. } => {
                let all: Vec<Qubit> = self.max_times.keys().copied().collect();
                let time = self.next_time(&all);
                let qubits = instruction.target().clone();
                self.qubits.extend(qubits.iter());
                self.insert(time, qubits, MomentType::Measure, instruction);
            }
            Operator::Gate(_) | Operator::PulseGate(_) => {
                let qubits = instruction.target().clone();
                let time = self.update_qubit_times(&qubits.to_vec());
                self.qubits.extend(qubits.iter());
                self.insert(time, qubits, MomentType::Gate, instruction);
            }
        }
    }

    fn insert(
        &mut self,
        time: usize,
        qubits: QubitSet,
        moment_type: MomentType,
        instruction: Instruction,
    ) {
        let mut key = MomentsKey {
            time,
            qubits,
            moment_type,
            noise_index: 0,
        };
        while self.moments.contains_key(&key) {
            key.noise_index += 1;
        }
        self.moments.insert(key, instruction);
        if moment_type != MomentType::GateNoise {
            self.depth = self.depth.max(time + 1);
        }
    }

    fn next_time(&self, qubits: &[Qubit]) -> usize {
        qubits
            .iter()
            .map(|q| self.max_times.get(q).copied().unwrap_or(0))
            .chain(std::iter::once(self.time_all_qubits))
            .max()
            .unwrap_or(0)
    }

    fn update_qubit_times(&mut self, qubits: &[Qubit]) -> usize {
        let time = self.next_time(qubits);
        for &q in qubits {
            self.max_times.insert(q, time + 1);
        }
        time
    }

    /// Instructions in insertion order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.moments.values()
    }

    /// Slots with their instructions, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&MomentsKey, &Instruction)> {
        self.moments.iter()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.moments.len()
    }

    /// Whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// Qubits touched by any instruction, in order of first use.
    pub fn qubits(&self) -> &QubitSet {
        &self.qubits
    }

    /// Number of time steps.
    pub fn depth(&self) -> usize {
        self.depth
    }
}
