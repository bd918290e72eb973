//! Noise channel types.
//!
//! Noise channels are applied like gates but never advance a qubit's time
//! in the moment grid; they attach to the moment of the gate before them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// A noise channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Noise {
    /// Bit-flip channel: applies X with probability `p`.
    BitFlip {
        /// Flip probability (0.0 to 0.5).
        probability: f64,
    },

    /// Phase-flip channel: applies Z with probability `p`.
    PhaseFlip {
        /// Flip probability (0.0 to 0.5).
        probability: f64,
    },

    /// Pauli channel with independent X, Y and Z probabilities.
    PauliChannel {
        /// Probability of X.
        probability_x: f64,
        /// Probability of Y.
        probability_y: f64,
        /// Probability of Z.
        probability_z: f64,
    },

    /// Single-qubit depolarizing channel.
    Depolarizing {
        /// Error probability (0.0 to 0.75).
        probability: f64,
    },

    /// Two-qubit depolarizing channel.
    TwoQubitDepolarizing {
        /// Error probability (0.0 to 15/16).
        probability: f64,
    },

    /// Two-qubit dephasing channel.
    TwoQubitDephasing {
        /// Error probability (0.0 to 0.75).
        probability: f64,
    },

    /// Amplitude damping: models energy relaxation (T1 decay).
    AmplitudeDamping {
        /// Damping parameter (0.0 to 1.0).
        gamma: f64,
    },

    /// Amplitude damping towards a thermal state.
    GeneralizedAmplitudeDamping {
        /// Damping parameter (0.0 to 1.0).
        gamma: f64,
        /// Excited-state population of the bath (0.0 to 1.0).
        probability: f64,
    },

    /// Phase damping: models dephasing (T2 decay without energy loss).
    PhaseDamping {
        /// Dephasing parameter (0.0 to 1.0).
        gamma: f64,
    },
}

impl Noise {
    /// Bit-flip channel, validating the probability range.
    pub fn bit_flip(probability: f64) -> IrResult<Self> {
        check_range("bit_flip", probability, 0.5)?;
        Ok(Noise::BitFlip { probability })
    }

    /// Phase-flip channel, validating the probability range.
    pub fn phase_flip(probability: f64) -> IrResult<Self> {
        check_range("phase_flip", probability, 0.5)?;
        Ok(Noise::PhaseFlip { probability })
    }

    /// Depolarizing channel, validating the probability range.
    pub fn depolarizing(probability: f64) -> IrResult<Self> {
        check_range("depolarizing", probability, 0.75)?;
        Ok(Noise::Depolarizing { probability })
    }

    /// Amplitude damping channel, validating the range of `gamma`.
    pub fn amplitude_damping(gamma: f64) -> IrResult<Self> {
        check_range("amplitude_damping", gamma, 1.0)?;
        Ok(Noise::AmplitudeDamping { gamma })
    }

    /// Phase damping channel, validating the range of `gamma`.
    pub fn phase_damping(gamma: f64) -> IrResult<Self> {
        check_range("phase_damping", gamma, 1.0)?;
        Ok(Noise::PhaseDamping { gamma })
    }

    /// OpenQASM pragma name of the channel.
    pub fn qasm_name(&self) -> &'static str {
        match self {
            Noise::BitFlip { .. } => "bit_flip",
            Noise::PhaseFlip { .. } => "phase_flip",
            Noise::PauliChannel { .. } => "pauli_channel",
            Noise::Depolarizing { .. } => "depolarizing",
            Noise::TwoQubitDepolarizing { .. } => "two_qubit_depolarizing",
            Noise::TwoQubitDephasing { .. } => "two_qubit_dephasing",
            Noise::AmplitudeDamping { .. } => "amplitude_damping",
            Noise::GeneralizedAmplitudeDamping { .. } => "generalized_amplitude_damping",
            Noise::PhaseDamping { .. } => "phase_damping",
        }
    }

    /// Number of qubits the channel acts on.
    pub fn qubit_count(&self) -> usize {
        match self {
            Noise::TwoQubitDepolarizing { .. } | Noise::TwoQubitDephasing { .. } => 2,
            _ => 1,
        }
    }

    /// Channel parameters in pragma order.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Noise::BitFlip { probability }
            | Noise::PhaseFlip { probability }
            | Noise::Depolarizing { probability }
            | Noise::TwoQubitDepolarizing { probability }
            | Noise::TwoQubitDephasing { probability } => vec![*probability],
            Noise::PauliChannel {
                probability_x,
                probability_y,
                probability_z,
            } => vec![*probability_x, *probability_y, *probability_z],
            Noise::AmplitudeDamping { gamma } | Noise::PhaseDamping { gamma } => vec![*gamma],
            Noise::GeneralizedAmplitudeDamping { gamma, probability } => {
                vec![*gamma, *probability]
            }
        }
    }

    /// Rebuild a channel from its pragma name and parameters.
    pub fn from_qasm_name(name: &str, params: &[f64]) -> Option<Noise> {
        match (name, params) {
            ("bit_flip", [p]) => Some(Noise::BitFlip { probability: *p }),
            ("phase_flip", [p]) => Some(Noise::PhaseFlip { probability: *p }),
            ("pauli_channel", [x, y, z]) => Some(Noise::PauliChannel {
                probability_x: *x,
                probability_y: *y,
                probability_z: *z,
            }),
            ("depolarizing", [p]) => Some(Noise::Depolarizing { probability: *p }),
            ("two_qubit_depolarizing", [p]) => Some(Noise::TwoQubitDepolarizing { probability: *p }),
            ("two_qubit_dephasing", [p]) => Some(Noise::TwoQubitDephasing { probability: *p }),
            ("amplitude_damping", [g]) => Some(Noise::AmplitudeDamping { gamma: *g }),
            ("generalized_amplitude_damping", [g, p]) => Some(Noise::GeneralizedAmplitudeDamping {
                gamma: *g,
                probability: *p,
            }),
            ("phase_damping", [g]) => Some(Noise::PhaseDamping { gamma: *g }),
            _ => None,
        }
    }
}

fn check_range(name: &str, value: f64, max: f64) -> IrResult<()> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(IrError::InvalidNoiseParameter {
            name: name.to_string(),
            value,
            max,
        })
    }
}

impl fmt::Display for Noise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters().iter().map(|p| format!("{p:?}")).collect();
        write!(f, "{}({})", self.qasm_name(), params.join(", "))
    }
}
