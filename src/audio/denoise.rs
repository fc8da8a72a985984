//! # Frame Orchestrator
//!
//! Drives telephony audio through the suppressor one 10ms frame at a time:
//!
//! 1. Upsample the 80-sample frame to 480 samples at 48 kHz
//! 2. Ask the suppressor to clean it
//! 3. On failure, or on a result that is not exactly 480 samples at 48 kHz,
//!    keep the upsampled frame instead (pass-through fallback)
//! 4. Downsample whichever frame survived back to 80 samples
//! 5. Append to the output
//!
//! A failing frame never aborts the request, and neither does a suppressor
//! that panics: the panic is caught at the frame boundary and treated like
//! any other failure. Only shape violations in the
//! resampler itself propagate, since those mean the caller broke the contract.
//!
//! The orchestrator keeps no state between calls; any temporal memory lives
//! inside the suppressor.

use crate::audio::error::PipelineError;
use crate::audio::frame::{self, Frame};
use crate::audio::resample::Resampler;
use crate::audio::suppressor::{NoiseSuppressor, SuppressionError};
use crate::audio::{MODEL_FRAME_LEN, MODEL_SAMPLE_RATE, TELEPHONY_FRAME_LEN, TELEPHONY_SAMPLE_RATE};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The suppressor cleaned the frame
    Suppressed { confidence: f32 },
    /// The upsampled input was used unchanged
    PassedThrough { reason: String },
}

/// Output of one orchestration run.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiseOutput {
    /// Cleaned samples at 8 kHz; always the padded input length
    pub samples: Vec<f32>,
    /// One outcome per frame, in order
    pub outcomes: Vec<FrameOutcome>,
}

impl DenoiseOutput {
    pub fn frame_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn fallback_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FrameOutcome::PassedThrough { .. }))
            .count()
    }

    /// Mean confidence over frames the suppressor actually cleaned.
    pub fn mean_confidence(&self) -> Option<f32> {
        let confidences: Vec<f32> = self
            .outcomes
            .iter()
            .filter_map(|o| match o {
                FrameOutcome::Suppressed { confidence } => Some(*confidence),
                FrameOutcome::PassedThrough { .. } => None,
            })
            .collect();

        if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        }
    }
}

/// Per-frame driver between the resampler and a suppressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameOrchestrator {
    resampler: Resampler,
}

impl FrameOrchestrator {
    /// Clean normalized 8 kHz samples frame by frame.
    ///
    /// Input that is not a whole number of frames is zero-padded first, so the
    /// output length is always `ceil(len / 80) * 80`.
    pub fn process<S>(
        &self,
        suppressor: &mut S,
        samples: &[f32],
    ) -> Result<DenoiseOutput, PipelineError>
    where
        S: NoiseSuppressor + ?Sized,
    {
        let frames = frame::segment(samples, TELEPHONY_FRAME_LEN, TELEPHONY_SAMPLE_RATE)?;

        let mut output = Vec::with_capacity(frames.len() * TELEPHONY_FRAME_LEN);
        let mut outcomes = Vec::with_capacity(frames.len());

        for (index, input) in frames.iter().enumerate() {
            let (cleaned, outcome) = self.process_frame(suppressor, input)?;

            if let FrameOutcome::PassedThrough { reason } = &outcome {
                debug!(frame = index, reason = %reason, "Suppression failed, passing frame through");
            }

            output.extend(cleaned.into_samples());
            outcomes.push(outcome);
        }

        Ok(DenoiseOutput {
            samples: output,
            outcomes,
        })
    }

    /// Run a single 8 kHz frame through up → suppress → down.
    pub fn process_frame<S>(
        &self,
        suppressor: &mut S,
        input: &Frame,
    ) -> Result<(Frame, FrameOutcome), PipelineError>
    where
        S: NoiseSuppressor + ?Sized,
    {
        let upsampled = self.resampler.upsample(input)?;

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| suppressor.denoise(&upsampled)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                warn!(suppressor = suppressor.name(), panic = %message, "Suppressor panicked");
                Err(SuppressionError::Backend(format!("suppressor panicked: {}", message)))
            });

        let (survivor, outcome) = match attempt {
            Ok(result) if is_model_frame(&result.frame) => (
                result.frame,
                FrameOutcome::Suppressed {
                    confidence: result.confidence,
                },
            ),
            Ok(result) => {
                let reason = SuppressionError::InvalidInput {
                    expected: MODEL_FRAME_LEN,
                    expected_rate: MODEL_SAMPLE_RATE,
                    actual: result.frame.len(),
                    actual_rate: result.frame.sample_rate(),
                };
                (
                    upsampled,
                    FrameOutcome::PassedThrough {
                        reason: format!("malformed suppressor output: {}", reason),
                    },
                )
            }
            Err(e) => (
                upsampled,
                FrameOutcome::PassedThrough {
                    reason: e.to_string(),
                },
            ),
        };

        let downsampled = self.resampler.downsample(&survivor)?;
        Ok((downsampled, outcome))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn is_model_frame(frame: &Frame) -> bool {
    frame.len() == MODEL_FRAME_LEN && frame.sample_rate() == MODEL_SAMPLE_RATE
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::suppressor::{PassthroughSuppressor, SuppressedFrame};

    /// Always fails.
    pub(crate) struct FailingSuppressor;

    impl NoiseSuppressor for FailingSuppressor {
        fn name(&self) -> &str {
            "failing"
        }

        fn denoise(&mut self, _frame: &Frame) -> Result<SuppressedFrame, SuppressionError> {
            Err(SuppressionError::Backend("model unavailable".to_string()))
        }
    }

    /// Panics on its first call, then behaves like the passthrough.
    #[derive(Default)]
    pub(crate) struct PanicOnceSuppressor {
        calls: usize,
    }

    impl NoiseSuppressor for PanicOnceSuppressor {
        fn name(&self) -> &str {
            "panic-once"
        }

        fn denoise(&mut self, frame: &Frame) -> Result<SuppressedFrame, SuppressionError> {
            self.calls += 1;
            if self.calls == 1 {
                panic!("model state corrupted");
            }
            PassthroughSuppressor.denoise(frame)
        }
    }

    /// Returns a frame of the wrong length.
    struct TruncatingSuppressor;

    impl NoiseSuppressor for TruncatingSuppressor {
        fn name(&self) -> &str {
            "truncating"
        }

        fn denoise(&mut self, frame: &Frame) -> Result<SuppressedFrame, SuppressionError> {
            Ok(SuppressedFrame {
                confidence: 0.9,
                frame: Frame::new(MODEL_SAMPLE_RATE, frame.samples()[..479].to_vec()),
            })
        }
    }

    /// Halves every sample and fails on every other frame.
    struct FlakySuppressor {
        calls: usize,
    }

    impl NoiseSuppressor for FlakySuppressor {
        fn name(&self) -> &str {
            "flaky"
        }

        fn denoise(&mut self, frame: &Frame) -> Result<SuppressedFrame, SuppressionError> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                return Err(SuppressionError::NonFinite);
            }
            let samples = frame.samples().iter().map(|s| s * 0.5).collect();
            Ok(SuppressedFrame {
                confidence: 0.4,
                frame: Frame::new(MODEL_SAMPLE_RATE, samples),
            })
        }
    }

    fn wave(len: usize) -> Vec<f32> {
        (0..len).map(|i| ((i as f32) * 0.3).sin() * 0.6).collect()
    }

    fn round_trip(samples: &[f32]) -> Vec<f32> {
        let resampler = Resampler::telephony();
        let frames = frame::segment(samples, TELEPHONY_FRAME_LEN, TELEPHONY_SAMPLE_RATE).unwrap();
        frames
            .iter()
            .flat_map(|f| {
                let up = resampler.upsample(f).unwrap();
                resampler.downsample(&up).unwrap().into_samples()
            })
            .collect()
    }

    #[test]
    fn test_output_length_is_padded_length() {
        let orchestrator = FrameOrchestrator::default();
        let mut suppressor = PassthroughSuppressor;
        for len in [0usize, 1, 80, 100, 160, 241] {
            let output = orchestrator.process(&mut suppressor, &wave(len)).unwrap();
            assert_eq!(output.samples.len(), (len + 79) / 80 * 80);
            assert_eq!(output.frame_count(), (len + 79) / 80);
        }
    }

    #[test]
    fn test_always_failing_suppressor_degrades_to_resample_round_trip() {
        let samples = wave(200);
        let output = FrameOrchestrator::default()
            .process(&mut FailingSuppressor, &samples)
            .unwrap();

        assert_eq!(output.samples, round_trip(&samples));
        assert_eq!(output.fallback_count(), 3);
        assert_eq!(output.mean_confidence(), None);
        assert!(output.outcomes.iter().all(|o| matches!(
            o,
            FrameOutcome::PassedThrough { reason } if reason == "model unavailable"
        )));
    }

    #[test]
    fn test_wrong_length_result_falls_back() {
        let samples = wave(80);
        let output = FrameOrchestrator::default()
            .process(&mut TruncatingSuppressor, &samples)
            .unwrap();

        assert_eq!(output.samples, round_trip(&samples));
        assert_eq!(output.fallback_count(), 1);
    }

    #[test]
    fn test_identity_suppressor_matches_fallback_path() {
        let samples = wave(160);
        let orchestrator = FrameOrchestrator::default();
        let identity = orchestrator.process(&mut PassthroughSuppressor, &samples).unwrap();
        let failing = orchestrator.process(&mut FailingSuppressor, &samples).unwrap();

        assert_eq!(identity.samples, failing.samples);
        assert_eq!(identity.fallback_count(), 0);
        assert_eq!(identity.mean_confidence(), Some(1.0));
    }

    #[test]
    fn test_one_bad_frame_does_not_affect_the_others() {
        let samples = wave(320);
        let mut suppressor = FlakySuppressor { calls: 0 };
        let output = FrameOrchestrator::default()
            .process(&mut suppressor, &samples)
            .unwrap();
        let reference = round_trip(&samples);

        assert_eq!(suppressor.calls, 4);
        assert_eq!(output.fallback_count(), 2);
        assert_eq!(output.mean_confidence(), Some(0.4));

        // Frames 0 and 2 were halved, frames 1 and 3 passed through
        for (i, (&got, &base)) in output.samples.iter().zip(reference.iter()).enumerate() {
            let expected = if (i / 80) % 2 == 0 { base * 0.5 } else { base };
            assert!((got - expected).abs() < 1e-6, "sample {}", i);
        }
    }

    #[test]
    fn test_panicking_suppressor_falls_back_for_that_frame_only() {
        let samples = wave(240);
        let mut suppressor = PanicOnceSuppressor::default();
        let output = FrameOrchestrator::default()
            .process(&mut suppressor, &samples)
            .unwrap();

        assert_eq!(output.samples, round_trip(&samples));
        assert_eq!(output.fallback_count(), 1);
        assert!(matches!(
            &output.outcomes[0],
            FrameOutcome::PassedThrough { reason } if reason.contains("model state corrupted")
        ));
        assert_eq!(output.outcomes[1], FrameOutcome::Suppressed { confidence: 1.0 });
    }

    #[test]
    fn test_silence_stays_silent() {
        let output = FrameOrchestrator::default()
            .process(&mut PassthroughSuppressor, &[0.0; 80])
            .unwrap();
        assert!(output.samples.iter().all(|&s| s == 0.0));
    }
}
