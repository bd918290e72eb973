//! Result types requested from a circuit run.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::observable::Observable;
use crate::parameter::FreeParameter;
use crate::qubit::{Qubit, QubitSet};

/// Coarse classification used by observable bookkeeping and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultTypeKind {
    /// Probability: implicitly measures Pauli Z.
    Probability,
    /// Expectation, variance or sample of an observable.
    ObservableBased,
    /// Observable result carrying free parameters (adjoint gradient).
    ParametricObservableBased,
    /// State vector or density matrix.
    StateVectorLike,
    /// Amplitudes of chosen basis states.
    AmplitudeLike,
}

/// A result type. An empty target means "all qubits".
///
/// Equality is sensitive to target order: a tensor observable on `[0, 1]`
/// and the same observable on `[1, 0]` are different requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResultType {
    /// Expectation value of an observable.
    Expectation {
        /// Measured observable.
        observable: Observable,
        /// Target qubits.
        target: QubitSet,
    },
    /// Variance of an observable.
    Variance {
        /// Measured observable.
        observable: Observable,
        /// Target qubits.
        target: QubitSet,
    },
    /// Samples of an observable.
    Sample {
        /// Measured observable.
        observable: Observable,
        /// Target qubits.
        target: QubitSet,
    },
    /// Computational-basis probabilities.
    Probability {
        /// Target qubits.
        target: QubitSet,
    },
    /// Reduced density matrix.
    DensityMatrix {
        /// Target qubits.
        target: QubitSet,
    },
    /// Full state vector.
    StateVector,
    /// Amplitudes of the given bitstrings.
    Amplitude {
        /// Basis states such as `"01"`.
        states: Vec<String>,
    },
    /// Gradient of an expectation value with respect to free parameters.
    AdjointGradient {
        /// Observable whose expectation is differentiated.
        observable: Observable,
        /// Target qubits.
        target: QubitSet,
        /// Parameters to differentiate by; empty means all.
        parameters: Vec<FreeParameter>,
    },
}

fn check_observable_target(observable: &Observable, target: &QubitSet) -> IrResult<()> {
    let expected = observable.qubit_count();
    let mismatch = if target.is_empty() {
        expected != 1
    } else {
        expected != target.len()
    };
    if mismatch {
        return Err(IrError::ObservableTargetMismatch {
            observable: expected,
            target: target.len(),
        });
    }
    Ok(())
}

impl ResultType {
    /// Expectation of `observable` on `target`.
    pub fn expectation(observable: Observable, target: impl Into<QubitSet>) -> IrResult<Self> {
        let target = target.into();
        check_observable_target(&observable, &target)?;
        Ok(ResultType::Expectation { observable, target })
    }

    /// Variance of `observable` on `target`.
    pub fn variance(observable: Observable, target: impl Into<QubitSet>) -> IrResult<Self> {
        let target = target.into();
        check_observable_target(&observable, &target)?;
        Ok(ResultType::Variance { observable, target })
    }

    /// Samples of `observable` on `target`.
    pub fn sample(observable: Observable, target: impl Into<QubitSet>) -> IrResult<Self> {
        let target = target.into();
        check_observable_target(&observable, &target)?;
        Ok(ResultType::Sample { observable, target })
    }

    /// Probabilities on `target`.
    pub fn probability(target: impl Into<QubitSet>) -> Self {
        ResultType::Probability {
            target: target.into(),
        }
    }

    /// Density matrix on `target`.
    pub fn density_matrix(target: impl Into<QubitSet>) -> Self {
        ResultType::DensityMatrix {
            target: target.into(),
        }
    }

    /// Amplitudes of `states`, each a non-empty bitstring.
    pub fn amplitude(states: Vec<String>) -> IrResult<Self> {
        let valid = !states.is_empty()
            && states
                .iter()
                .all(|s| !s.is_empty() && s.chars().all(|c| c == '0' || c == '1'));
        if !valid {
            return Err(IrError::InvalidResultType(format!(
                "amplitude states must be non-empty bitstrings, got {states:?}"
            )));
        }
        Ok(ResultType::Amplitude { states })
    }

    /// Adjoint gradient of `observable` on `target`.
    pub fn adjoint_gradient(
        observable: Observable,
        target: impl Into<QubitSet>,
        parameters: Vec<FreeParameter>,
    ) -> IrResult<Self> {
        let target = target.into();
        check_observable_target(&observable, &target)?;
        Ok(ResultType::AdjointGradient {
            observable,
            target,
            parameters,
        })
    }

    /// The kind tag.
    pub fn kind(&self) -> ResultTypeKind {
        match self {
            ResultType::Expectation { .. } | ResultType::Variance { .. } | ResultType::Sample { .. } => {
                ResultTypeKind::ObservableBased
            }
            ResultType::Probability { .. } => ResultTypeKind::Probability,
            ResultType::AdjointGradient { .. } => ResultTypeKind::ParametricObservableBased,
            ResultType::DensityMatrix { .. } | ResultType::StateVector => {
                ResultTypeKind::StateVectorLike
            }
            ResultType::Amplitude { .. } => ResultTypeKind::AmplitudeLike,
        }
    }

    /// The explicit observable, if any.
    pub fn observable(&self) -> Option<&Observable> {
        match self {
            ResultType::Expectation { observable, .. }
            | ResultType::Variance { observable, .. }
            | ResultType::Sample { observable, .. }
            | ResultType::AdjointGradient { observable, .. } => Some(observable),
            _ => None,
        }
    }

    /// The observable that determines the measurement basis.
    ///
    /// Probability measures Pauli Z; adjoint gradients do not constrain
    /// the basis.
    pub fn measured_observable(&self) -> Option<Observable> {
        match self.kind() {
            ResultTypeKind::Probability => Some(Observable::PauliZ),
            ResultTypeKind::ObservableBased => self.observable().cloned(),
            _ => None,
        }
    }

    /// The target, for result types that have one.
    pub fn target(&self) -> Option<&QubitSet> {
        match self {
            ResultType::Expectation { target, .. }
            | ResultType::Variance { target, .. }
            | ResultType::Sample { target, .. }
            | ResultType::Probability { target }
            | ResultType::DensityMatrix { target }
            | ResultType::AdjointGradient { target, .. } => Some(target),
            ResultType::StateVector | ResultType::Amplitude { .. } => None,
        }
    }

    /// OpenQASM / JAQCD name.
    pub fn name(&self) -> &'static str {
        match self {
            ResultType::Expectation { .. } => "expectation",
            ResultType::Variance { .. } => "variance",
            ResultType::Sample { .. } => "sample",
            ResultType::Probability { .. } => "probability",
            ResultType::DensityMatrix { .. } => "density_matrix",
            ResultType::StateVector => "state_vector",
            ResultType::Amplitude { .. } => "amplitude",
            ResultType::AdjointGradient { .. } => "adjoint_gradient",
        }
    }

    /// Copy with targets passed through `mapping`; unmapped qubits are kept.
    #[must_use]
    pub fn remapped(&self, mapping: &FxHashMap<Qubit, Qubit>) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            ResultType::Expectation { target, .. }
            | ResultType::Variance { target, .. }
            | ResultType::Sample { target, .. }
            | ResultType::Probability { target }
            | ResultType::DensityMatrix { target }
            | ResultType::AdjointGradient { target, .. } => {
                *target = target
                    .iter()
                    .map(|q| mapping.get(&q).copied().unwrap_or(q))
                    .collect();
            }
            ResultType::StateVector | ResultType::Amplitude { .. } => {}
        }
        copy
    }
}

impl PartialEq for ResultType {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: &QubitSet, b: &QubitSet) -> bool {
            a.iter().eq(b.iter())
        }
        match (self, other) {
            (
                ResultType::Expectation { observable: o1, target: t1 },
                ResultType::Expectation { observable: o2, target: t2 },
            )
            | (
                ResultType::Variance { observable: o1, target: t1 },
                ResultType::Variance { observable: o2, target: t2 },
            )
            | (
                ResultType::Sample { observable: o1, target: t1 },
                ResultType::Sample { observable: o2, target: t2 },
            ) => o1 == o2 && same(t1, t2),
            (ResultType::Probability { target: t1 }, ResultType::Probability { target: t2 })
            | (
                ResultType::DensityMatrix { target: t1 },
                ResultType::DensityMatrix { target: t2 },
            ) => same(t1, t2),
            (ResultType::StateVector, ResultType::StateVector) => true,
            (ResultType::Amplitude { states: s1 }, ResultType::Amplitude { states: s2 }) => s1 == s2,
            (
                ResultType::AdjointGradient {
                    observable: o1,
                    target: t1,
                    parameters: p1,
                },
                ResultType::AdjointGradient {
                    observable: o2,
                    target: t2,
                    parameters: p2,
                },
            ) => o1 == o2 && same(t1, t2) && p1 == p2,
            _ => false,
        }
    }
}
