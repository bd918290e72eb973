//! Pulse-level resources and sequences.
//!
//! A [`PulseSequence`] is an ordered list of frame operations. Every frame
//! and waveform a sequence touches is registered by id so that the
//! calibration preamble can declare each of them exactly once.

use indexmap::IndexMap;
use num_complex::Complex64;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{IrError, IrResult};
use crate::parameter::{FreeParameter, FreeParameterExpression as Expr};

/// A hardware port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port identifier.
    pub id: String,
    /// Sample period in seconds.
    pub dt: f64,
}

impl Port {
    /// Create a port.
    pub fn new(id: impl Into<String>, dt: f64) -> Self {
        Self { id: id.into(), dt }
    }
}

/// A frame: a port plus a carrier frequency and phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame identifier.
    pub id: String,
    /// Port the frame drives.
    pub port: Port,
    /// Carrier frequency in Hz.
    pub frequency: f64,
    /// Initial phase in radians.
    pub phase: f64,
    /// Predefined frames exist on the device and are never declared.
    pub is_predefined: bool,
}

impl Frame {
    /// Create a frame that must be declared before use.
    pub fn new(id: impl Into<String>, port: Port, frequency: f64, phase: f64) -> Self {
        Self {
            id: id.into(),
            port,
            frequency,
            phase,
            is_predefined: false,
        }
    }

    /// Create a frame the device already provides.
    pub fn predefined(id: impl Into<String>, port: Port, frequency: f64, phase: f64) -> Self {
        Self {
            is_predefined: true,
            ..Self::new(id, port, frequency, phase)
        }
    }
}

/// A waveform played on a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Waveform {
    /// Explicit complex samples.
    Arbitrary {
        /// Waveform identifier.
        id: String,
        /// Samples, one per `dt`.
        amplitudes: Vec<Complex64>,
    },
    /// Constant amplitude for a duration.
    Constant {
        /// Waveform identifier.
        id: String,
        /// Duration in seconds.
        length: Expr,
        /// Complex amplitude.
        iq: Complex64,
    },
    /// Gaussian envelope.
    Gaussian {
        /// Waveform identifier.
        id: String,
        /// Duration in seconds.
        length: Expr,
        /// Width in seconds.
        sigma: Expr,
        /// Peak amplitude.
        amplitude: Expr,
        /// Shift the envelope so it is zero at both ends.
        zero_at_edges: bool,
    },
    /// Gaussian with a derivative (DRAG) correction.
    DragGaussian {
        /// Waveform identifier.
        id: String,
        /// Duration in seconds.
        length: Expr,
        /// Width in seconds.
        sigma: Expr,
        /// DRAG coefficient.
        beta: Expr,
        /// Peak amplitude.
        amplitude: Expr,
        /// Shift the envelope so it is zero at both ends.
        zero_at_edges: bool,
    },
}

impl Waveform {
    /// Waveform identifier.
    pub fn id(&self) -> &str {
        match self {
            Waveform::Arbitrary { id, .. }
            | Waveform::Constant { id, .. }
            | Waveform::Gaussian { id, .. }
            | Waveform::DragGaussian { id, .. } => id,
        }
    }

    fn expressions(&self) -> Vec<&Expr> {
        match self {
            Waveform::Arbitrary { .. } => vec![],
            Waveform::Constant { length, .. } => vec![length],
            Waveform::Gaussian {
                length,
                sigma,
                amplitude,
                ..
            } => vec![length, sigma, amplitude],
            Waveform::DragGaussian {
                length,
                sigma,
                beta,
                amplitude,
                ..
            } => vec![length, sigma, beta, amplitude],
        }
    }

    #[must_use]
    fn bind(&self, values: &FxHashMap<String, f64>) -> Waveform {
        match self {
            Waveform::Arbitrary { .. } => self.clone(),
            Waveform::Constant { id, length, iq } => Waveform::Constant {
                id: id.clone(),
                length: length.subs(values),
                iq: *iq,
            },
            Waveform::Gaussian {
                id,
                length,
                sigma,
                amplitude,
                zero_at_edges,
            } => Waveform::Gaussian {
                id: id.clone(),
                length: length.subs(values),
                sigma: sigma.subs(values),
                amplitude: amplitude.subs(values),
                zero_at_edges: *zero_at_edges,
            },
            Waveform::DragGaussian {
                id,
                length,
                sigma,
                beta,
                amplitude,
                zero_at_edges,
            } => Waveform::DragGaussian {
                id: id.clone(),
                length: length.subs(values),
                sigma: sigma.subs(values),
                beta: beta.subs(values),
                amplitude: amplitude.subs(values),
                zero_at_edges: *zero_at_edges,
            },
        }
    }
}

/// One operation of a pulse sequence.
///
/// Frames and waveforms are referenced by id; their definitions live in
/// the owning [`PulseSequence`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PulseInstruction {
    /// Set the frame frequency.
    SetFrequency {
        /// Frame id.
        frame: String,
        /// New frequency in Hz.
        frequency: Expr,
    },
    /// Shift the frame frequency.
    ShiftFrequency {
        /// Frame id.
        frame: String,
        /// Frequency offset in Hz.
        frequency: Expr,
    },
    /// Set the frame phase.
    SetPhase {
        /// Frame id.
        frame: String,
        /// New phase in radians.
        phase: Expr,
    },
    /// Shift the frame phase.
    ShiftPhase {
        /// Frame id.
        frame: String,
        /// Phase offset in radians.
        phase: Expr,
    },
    /// Set the amplitude scale of the frame.
    SetScale {
        /// Frame id.
        frame: String,
        /// Scale factor.
        scale: Expr,
    },
    /// Play a waveform on a frame.
    Play {
        /// Frame id.
        frame: String,
        /// Waveform id.
        waveform: String,
    },
    /// Capture raw acquisition data on a frame.
    CaptureV0 {
        /// Frame id.
        frame: String,
    },
    /// Idle the frames for a duration.
    Delay {
        /// Frame ids.
        frames: Vec<String>,
        /// Duration in seconds.
        duration: Expr,
    },
    /// Align the frames.
    Barrier {
        /// Frame ids.
        frames: Vec<String>,
    },
}

impl PulseInstruction {
    fn expression(&self) -> Option<&Expr> {
        match self {
            PulseInstruction::SetFrequency { frequency, .. }
            | PulseInstruction::ShiftFrequency { frequency, .. } => Some(frequency),
            PulseInstruction::SetPhase { phase, .. } | PulseInstruction::ShiftPhase { phase, .. } => {
                Some(phase)
            }
            PulseInstruction::SetScale { scale, .. } => Some(scale),
            PulseInstruction::Delay { duration, .. } => Some(duration),
            PulseInstruction::Play { .. }
            | PulseInstruction::CaptureV0 { .. }
            | PulseInstruction::Barrier { .. } => None,
        }
    }

    #[must_use]
    fn bind(&self, values: &FxHashMap<String, f64>) -> PulseInstruction {
        let mut bound = self.clone();
        match &mut bound {
            PulseInstruction::SetFrequency { frequency, .. }
            | PulseInstruction::ShiftFrequency { frequency, .. } => {
                *frequency = frequency.subs(values);
            }
            PulseInstruction::SetPhase { phase, .. } | PulseInstruction::ShiftPhase { phase, .. } => {
                *phase = phase.subs(values);
            }
            PulseInstruction::SetScale { scale, .. } => *scale = scale.subs(values),
            PulseInstruction::Delay { duration, .. } => *duration = duration.subs(values),
            PulseInstruction::Play { .. }
            | PulseInstruction::CaptureV0 { .. }
            | PulseInstruction::Barrier { .. } => {}
        }
        bound
    }
}

/// An ordered pulse program together with the frames and waveforms it uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PulseSequence {
    instructions: Vec<PulseInstruction>,
    frames: IndexMap<String, Frame>,
    waveforms: IndexMap<String, Waveform>,
}

impl PulseSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[PulseInstruction] {
        &self.instructions
    }

    /// Frames used by the sequence, in order of first use.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    /// Waveforms used by the sequence, in order of first use.
    pub fn waveforms(&self) -> impl Iterator<Item = &Waveform> {
        self.waveforms.values()
    }

    /// Whether the sequence has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Free parameters referenced by instructions or waveforms.
    pub fn parameters(&self) -> BTreeSet<FreeParameter> {
        let mut set = BTreeSet::new();
        for expr in self.instructions.iter().filter_map(PulseInstruction::expression) {
            expr.collect_parameters(&mut set);
        }
        for expr in self.waveforms.values().flat_map(Waveform::expressions) {
            expr.collect_parameters(&mut set);
        }
        set
    }

    /// Substitute parameter values throughout the sequence.
    #[must_use]
    pub fn bind(&self, values: &FxHashMap<String, f64>) -> PulseSequence {
        PulseSequence {
            instructions: self.instructions.iter().map(|i| i.bind(values)).collect(),
            frames: self.frames.clone(),
            waveforms: self
                .waveforms
                .iter()
                .map(|(id, wf)| (id.clone(), wf.bind(values)))
                .collect(),
        }
    }

    /// Set the frequency of `frame`.
    pub fn set_frequency(&mut self, frame: &Frame, frequency: impl Into<Expr>) -> IrResult<&mut Self> {
        let frame = self.register_frame(frame)?;
        self.instructions.push(PulseInstruction::SetFrequency {
            frame,
            frequency: frequency.into(),
        });
        Ok(self)
    }

    /// Shift the frequency of `frame`.
    pub fn shift_frequency(&mut self, frame: &Frame, frequency: impl Into<Expr>) -> IrResult<&mut Self> {
        let frame = self.register_frame(frame)?;
        self.instructions.push(PulseInstruction::ShiftFrequency {
            frame,
            frequency: frequency.into(),
        });
        Ok(self)
    }

    /// Set the phase of `frame`.
    pub fn set_phase(&mut self, frame: &Frame, phase: impl Into<Expr>) -> IrResult<&mut Self> {
        let frame = self.register_frame(frame)?;
        self.instructions.push(PulseInstruction::SetPhase {
            frame,
            phase: phase.into(),
        });
        Ok(self)
    }

    /// Shift the phase of `frame`.
    pub fn shift_phase(&mut self, frame: &Frame, phase: impl Into<Expr>) -> IrResult<&mut Self> {
        let frame = self.register_frame(frame)?;
        self.instructions.push(PulseInstruction::ShiftPhase {
            frame,
            phase: phase.into(),
        });
        Ok(self)
    }

    /// Set the amplitude scale of `frame`.
    pub fn set_scale(&mut self, frame: &Frame, scale: impl Into<Expr>) -> IrResult<&mut Self> {
        let frame = self.register_frame(frame)?;
        self.instructions.push(PulseInstruction::SetScale {
            frame,
            scale: scale.into(),
        });
        Ok(self)
    }

    /// Play `waveform` on `frame`.
    pub fn play(&mut self, frame: &Frame, waveform: &Waveform) -> IrResult<&mut Self> {
        let frame = self.register_frame(frame)?;
        let waveform = self.register_waveform(waveform)?;
        self.instructions.push(PulseInstruction::Play { frame, waveform });
        Ok(self)
    }

    /// Capture acquisition data on `frame`.
    pub fn capture_v0(&mut self, frame: &Frame) -> IrResult<&mut Self> {
        let frame = self.register_frame(frame)?;
        self.instructions.push(PulseInstruction::CaptureV0 { frame });
        Ok(self)
    }

    /// Idle `frames` for `duration` seconds.
    pub fn delay(&mut self, frames: &[Frame], duration: impl Into<Expr>) -> IrResult<&mut Self> {
        let frames = frames
            .iter()
            .map(|f| self.register_frame(f))
            .collect::<IrResult<Vec<_>>>()?;
        self.instructions.push(PulseInstruction::Delay {
            frames,
            duration: duration.into(),
        });
        Ok(self)
    }

    /// Align `frames`.
    pub fn barrier(&mut self, frames: &[Frame]) -> IrResult<&mut Self> {
        let frames = frames
            .iter()
            .map(|f| self.register_frame(f))
            .collect::<IrResult<Vec<_>>>()?;
        self.instructions.push(PulseInstruction::Barrier { frames });
        Ok(self)
    }

    fn register_frame(&mut self, frame: &Frame) -> IrResult<String> {
        register(&mut self.frames, "frame", &frame.id, frame)?;
        Ok(frame.id.clone())
    }

    fn register_waveform(&mut self, waveform: &Waveform) -> IrResult<String> {
        register(&mut self.waveforms, "waveform", waveform.id(), waveform)?;
        Ok(waveform.id().to_string())
    }
}

/// Insert `value` under `id` unless a different value already owns the id.
pub(crate) fn register<T: Clone + PartialEq>(
    table: &mut IndexMap<String, T>,
    kind: &'static str,
    id: &str,
    value: &T,
) -> IrResult<()> {
    match table.get(id) {
        Some(existing) if existing != value => Err(IrError::NonUniqueResourceId {
            kind,
            id: id.to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            table.insert(id.to_string(), value.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive() -> Frame {
        Frame::new("q0_drive", Port::new("d0", 1e-9), 4.5e9, 0.0)
    }

    #[test]
    fn test_builder_registers_resources() {
        let wf = Waveform::Constant {
            id: "wf".into(),
            length: Expr::number(1e-7),
            iq: Complex64::new(0.5, 0.0),
        };
        let mut seq = PulseSequence::new();
        seq.set_frequency(&drive(), 4.6e9)
            .unwrap()
            .play(&drive(), &wf)
            .unwrap();
        assert_eq!(seq.instructions().len(), 2);
        assert_eq!(seq.frames().count(), 1);
        assert_eq!(seq.waveforms().count(), 1);
        assert!(seq.parameters().is_empty());
    }

    #[test]
    fn test_conflicting_frame_id_rejected() {
        let other = Frame::new("q0_drive", Port::new("d1", 1e-9), 5.0e9, 0.0);
        let mut seq = PulseSequence::new();
        seq.set_phase(&drive(), 0.1).unwrap();
        let err = seq.set_phase(&other, 0.2).unwrap_err();
        assert!(matches!(err, IrError::NonUniqueResourceId { kind: "frame", .. }));
        // Re-registering the identical frame is fine.
        assert!(seq.shift_phase(&drive(), 0.3).is_ok());
    }

    #[test]
    fn test_bind_parameters() {
        let wf = Waveform::Gaussian {
            id: "g".into(),
            length: Expr::parameter("length"),
            sigma: Expr::number(2e-8),
            amplitude: Expr::number(0.3),
            zero_at_edges: false,
        };
        let mut seq = PulseSequence::new();
        seq.shift_phase(&drive(), Expr::parameter("theta"))
            .unwrap()
            .play(&drive(), &wf)
            .unwrap();
        assert_eq!(seq.parameters().len(), 2);

        let mut values = FxHashMap::default();
        values.insert("theta".to_string(), 0.45);
        let bound = seq.bind(&values);
        assert_eq!(
            bound.parameters().into_iter().collect::<Vec<_>>(),
            vec![FreeParameter::new("length")]
        );
        assert_eq!(
            bound.instructions()[0],
            PulseInstruction::ShiftPhase {
                frame: "q0_drive".into(),
                phase: Expr::number(0.45),
            }
        );
    }
}
