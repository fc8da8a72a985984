//! # Noise Suppression Capability
//!
//! The suppressor is the only stateful piece of the cleaning pipeline. It takes
//! one 480-sample frame at 48 kHz and returns a cleaned frame plus a
//! voice-activity confidence, or a failure the orchestrator can branch on.
//!
//! ## Backends:
//! - **rnnoise**: RNNoise via the pure-Rust `nnnoiseless` port
//! - **passthrough**: Returns its input unchanged
//!
//! ## Thread Safety:
//! Suppressors are `Send` but take `&mut self`: frame order feeds the model's
//! internal adaptation, so one instance must only ever see one request at a
//! time. The host wraps a shared instance in a mutex.

use crate::audio::frame::Frame;
use crate::audio::{MODEL_FRAME_LEN, MODEL_SAMPLE_RATE};
use anyhow::{anyhow, Result};
use nnnoiseless::DenoiseState;
use thiserror::Error;

/// A successfully suppressed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressedFrame {
    /// Voice-activity probability reported by the model (0.0 to 1.0)
    pub confidence: f32,
    pub frame: Frame,
}

/// Why a suppressor could not clean one frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SuppressionError {
    #[error("expected {expected} samples at {expected_rate} Hz, got {actual} at {actual_rate} Hz")]
    InvalidInput {
        expected: usize,
        expected_rate: u32,
        actual: usize,
        actual_rate: u32,
    },

    #[error("model produced non-finite output")]
    NonFinite,

    #[error("{0}")]
    Backend(String),
}

/// Pluggable noise suppression backend.
pub trait NoiseSuppressor: Send {
    /// Short backend name for logs and health reports.
    fn name(&self) -> &str;

    /// Clean one 480-sample frame at 48 kHz.
    fn denoise(&mut self, frame: &Frame) -> Result<SuppressedFrame, SuppressionError>;
}

impl<S: NoiseSuppressor + ?Sized> NoiseSuppressor for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn denoise(&mut self, frame: &Frame) -> Result<SuppressedFrame, SuppressionError> {
        (**self).denoise(frame)
    }
}

fn check_model_frame(frame: &Frame) -> Result<(), SuppressionError> {
    if frame.len() != MODEL_FRAME_LEN || frame.sample_rate() != MODEL_SAMPLE_RATE {
        return Err(SuppressionError::InvalidInput {
            expected: MODEL_FRAME_LEN,
            expected_rate: MODEL_SAMPLE_RATE,
            actual: frame.len(),
            actual_rate: frame.sample_rate(),
        });
    }
    Ok(())
}

/// RNNoise-based suppressor.
///
/// RNNoise expects samples in the i16 range, so frames are scaled up by 32768
/// on the way in and back down on the way out.
pub struct RnnoiseSuppressor {
    state: Box<DenoiseState<'static>>,
    input: Vec<f32>,
    output: Vec<f32>,
}

impl RnnoiseSuppressor {
    pub fn new() -> Self {
        Self {
            state: DenoiseState::new(),
            input: vec![0.0; DenoiseState::FRAME_SIZE],
            output: vec![0.0; DenoiseState::FRAME_SIZE],
        }
    }
}

impl Default for RnnoiseSuppressor {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSuppressor for RnnoiseSuppressor {
    fn name(&self) -> &str {
        "rnnoise"
    }

    fn denoise(&mut self, frame: &Frame) -> Result<SuppressedFrame, SuppressionError> {
        check_model_frame(frame)?;

        for (dst, &src) in self.input.iter_mut().zip(frame.samples()) {
            *dst = src * 32768.0;
        }

        let confidence = self.state.process_frame(&mut self.output, &self.input);

        if !confidence.is_finite() || self.output.iter().any(|s| !s.is_finite()) {
            return Err(SuppressionError::NonFinite);
        }

        let samples = self.output.iter().map(|&s| s / 32768.0).collect();

        Ok(SuppressedFrame {
            confidence,
            frame: Frame::new(MODEL_SAMPLE_RATE, samples),
        })
    }
}

/// Identity suppressor: every frame comes back untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughSuppressor;

impl NoiseSuppressor for PassthroughSuppressor {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn denoise(&mut self, frame: &Frame) -> Result<SuppressedFrame, SuppressionError> {
        check_model_frame(frame)?;
        Ok(SuppressedFrame {
            confidence: 1.0,
            frame: frame.clone(),
        })
    }
}

/// Which suppressor backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressorKind {
    Rnnoise,
    Passthrough,
}

impl std::str::FromStr for SuppressorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rnnoise" => Ok(SuppressorKind::Rnnoise),
            "passthrough" | "identity" => Ok(SuppressorKind::Passthrough),
            _ => Err(anyhow!("Unknown suppression backend: {}", s)),
        }
    }
}

impl std::fmt::Display for SuppressorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SuppressorKind::Rnnoise => "rnnoise",
            SuppressorKind::Passthrough => "passthrough",
        };
        write!(f, "{}", name)
    }
}

/// Build a boxed suppressor from its configured backend name.
pub fn build_suppressor(backend: &str) -> Result<Box<dyn NoiseSuppressor>> {
    let kind: SuppressorKind = backend.parse()?;
    let suppressor: Box<dyn NoiseSuppressor> = match kind {
        SuppressorKind::Rnnoise => Box::new(RnnoiseSuppressor::new()),
        SuppressorKind::Passthrough => Box::new(PassthroughSuppressor),
    };
    tracing::info!(backend = %kind, "Noise suppressor initialized");
    Ok(suppressor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_frame(value: f32) -> Frame {
        Frame::new(MODEL_SAMPLE_RATE, vec![value; MODEL_FRAME_LEN])
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("rnnoise".parse::<SuppressorKind>().unwrap(), SuppressorKind::Rnnoise);
        assert_eq!("PassThrough".parse::<SuppressorKind>().unwrap(), SuppressorKind::Passthrough);
        assert!("deepfilter".parse::<SuppressorKind>().is_err());
        assert!(build_suppressor("nope").is_err());
    }

    #[test]
    fn test_passthrough_returns_input() {
        let mut suppressor = PassthroughSuppressor;
        let frame = model_frame(0.25);
        let result = suppressor.denoise(&frame).unwrap();
        assert_eq!(result.frame, frame);
    }

    #[test]
    fn test_rnnoise_keeps_frame_shape() {
        let mut suppressor = RnnoiseSuppressor::new();
        for _ in 0..3 {
            let result = suppressor.denoise(&model_frame(0.0)).unwrap();
            assert_eq!(result.frame.len(), MODEL_FRAME_LEN);
            assert_eq!(result.frame.sample_rate(), MODEL_SAMPLE_RATE);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn test_wrong_shape_is_an_error_not_a_panic() {
        let mut suppressor = RnnoiseSuppressor::new();
        let short = Frame::new(MODEL_SAMPLE_RATE, vec![0.0; 80]);
        assert!(matches!(
            suppressor.denoise(&short),
            Err(SuppressionError::InvalidInput { actual: 80, .. })
        ));

        let mut boxed: Box<dyn NoiseSuppressor> = Box::new(PassthroughSuppressor);
        let wrong_rate = Frame::new(8000, vec![0.0; MODEL_FRAME_LEN]);
        assert!(boxed.denoise(&wrong_rate).is_err());
        assert_eq!(boxed.name(), "passthrough");
    }
}
