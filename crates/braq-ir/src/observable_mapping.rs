//! Per-qubit observable bookkeeping.
//!
//! As result types are added, [`ObservableMapping`] records which observable
//! each qubit is measured in. Observables on the same qubit must agree
//! unless one of them is the identity; the first disagreement makes the
//! circuit permanently unsampleable and drops the recorded state.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

use crate::gate::Gate;
use crate::instruction::Instruction;
use crate::observable::Observable;
use crate::qubit::{Qubit, QubitSet};

/// Observable assignments for the qubits of one circuit.
#[derive(Debug, Clone)]
pub struct ObservableMapping {
    /// Observable applied to every qubit (a result type with no target).
    all_qubits: Option<Observable>,
    by_qubit: FxHashMap<Qubit, Observable>,
    /// Full target tuple of the observable recorded for each qubit.
    targets: FxHashMap<Qubit, Vec<Qubit>>,
    /// Qubits referenced by any observable result type.
    observable_qubits: QubitSet,
    simultaneously_measurable: bool,
}

impl Default for ObservableMapping {
    fn default() -> Self {
        Self {
            all_qubits: None,
            by_qubit: FxHashMap::default(),
            targets: FxHashMap::default(),
            observable_qubits: QubitSet::new(),
            simultaneously_measurable: true,
        }
    }
}

impl ObservableMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every recorded observable can be measured in one basis.
    pub fn simultaneously_measurable(&self) -> bool {
        self.simultaneously_measurable
    }

    /// Qubits referenced by observable result types.
    pub fn observable_qubits(&self) -> &QubitSet {
        &self.observable_qubits
    }

    /// The observable recorded for `qubit`, including an all-qubit one.
    pub fn observable_for(&self, qubit: Qubit) -> Option<&Observable> {
        self.all_qubits.as_ref().or_else(|| self.by_qubit.get(&qubit))
    }

    /// The target tuple recorded for `qubit`.
    pub fn target_for(&self, qubit: Qubit) -> Option<&[Qubit]> {
        self.targets.get(&qubit).map(Vec::as_slice)
    }

    /// Record that `target` qubits belong to an observable result type.
    pub fn add_observable_qubits(&mut self, target: &QubitSet) {
        self.observable_qubits.extend(target.iter());
    }

    /// Record `observable` measured on `target`.
    ///
    /// An empty target means all qubits. Tensor factors are matched to
    /// consecutive slices of the target by qubit count. Conflicts never
    /// fail; they clear the mapping and mark it unmeasurable.
    pub fn add(&mut self, observable: &Observable, target: &QubitSet) {
        if !self.simultaneously_measurable {
            return;
        }

        let qubits: Vec<Qubit> = if target.is_empty() {
            self.observable_qubits.to_vec()
        } else {
            target.to_vec()
        };
        let factor_slots = match observable {
            Observable::TensorProduct(_) => Some(tensor_product_slots(observable, &qubits)),
            _ => None,
        };

        for (i, &qubit) in qubits.iter().enumerate() {
            let (new_observable, new_target) = match &factor_slots {
                Some(slots) => match slots.get(i) {
                    Some((factor, slice)) => (*factor, slice.clone()),
                    None => break,
                },
                None => (observable, qubits.clone()),
            };
            let current = self.observable_for(qubit);

            let add = match current {
                None => true,
                Some(current) => current.is_identity() && !new_observable.is_identity(),
            };
            if let Some(current) = current {
                if !add
                    && !current.is_identity()
                    && !new_observable.is_identity()
                    && current != new_observable
                {
                    debug!(%qubit, %current, new = %new_observable, "non-commuting observables");
                    self.encounter_noncommuting_observable();
                    return;
                }
            }

            if target.is_empty() {
                continue;
            }
            if add {
                self.by_qubit.insert(qubit, new_observable.clone());
                self.targets.insert(qubit, new_target);
            } else if new_observable.qubit_count() > 1 {
                if let Some(current_target) = self.targets.get(&qubit) {
                    if *current_target != new_target {
                        debug!(%qubit, "observable target order differs");
                        self.encounter_noncommuting_observable();
                        return;
                    }
                }
            }
        }

        if target.is_empty() && !observable.is_identity() {
            if let Some(existing) = &self.all_qubits {
                if existing != observable {
                    debug!(%existing, new = %observable, "non-commuting all-qubit observables");
                    self.encounter_noncommuting_observable();
                    return;
                }
            }
            self.all_qubits = Some(observable.clone());
        }
    }

    /// Mark the circuit unmeasurable in a single basis and drop the state.
    pub fn encounter_noncommuting_observable(&mut self) {
        self.simultaneously_measurable = false;
        self.all_qubits = None;
        self.by_qubit.clear();
        self.targets.clear();
    }

    /// Instructions rotating every measured qubit into the computational basis.
    ///
    /// `circuit_qubits` is used for an all-qubit observable. Empty when the
    /// observables do not commute.
    pub fn basis_rotation_instructions(&self, circuit_qubits: &QubitSet) -> Vec<Instruction> {
        if !self.simultaneously_measurable {
            return vec![];
        }
        if let Some(observable) = &self.all_qubits {
            return circuit_qubits
                .iter()
                .flat_map(|q| rotation_instructions(observable, &[q]))
                .collect();
        }
        let target_lists: BTreeSet<&Vec<Qubit>> = self.targets.values().collect();
        target_lists
            .into_iter()
            .filter_map(|targets| {
                let first = targets.first()?;
                let observable = self.by_qubit.get(first)?;
                Some(rotation_instructions(observable, targets))
            })
            .flatten()
            .collect()
    }
}

/// Pair each qubit position with its tensor factor and the factor's slice
/// of the target.
fn tensor_product_slots<'a>(
    observable: &'a Observable,
    qubits: &[Qubit],
) -> Vec<(&'a Observable, Vec<Qubit>)> {
    let mut slots = Vec::with_capacity(qubits.len());
    let mut start = 0;
    for factor in observable.factors() {
        let end = (start + factor.qubit_count()).min(qubits.len());
        let slice = qubits[start..end].to_vec();
        for _ in start..end {
            slots.push((factor, slice.clone()));
        }
        start = end;
    }
    slots
}

fn rotation_instructions(observable: &Observable, targets: &[Qubit]) -> Vec<Instruction> {
    observable
        .basis_rotation_gates()
        .into_iter()
        .filter_map(|gate: Gate| Instruction::gate(gate, targets).ok())
        .collect()
}
