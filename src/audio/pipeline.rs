//! # Cleaning Pipeline
//!
//! One call from μ-law in to μ-law out:
//!
//! ```text
//! decode → normalize → segment(80) → orchestrate → denormalize → encode
//! ```
//!
//! The pipeline owns the suppressor handed to it at construction. It adds no
//! failure modes of its own: errors only come from the stages it composes.

use crate::audio::codec;
use crate::audio::denoise::{DenoiseOutput, FrameOrchestrator};
use crate::audio::error::PipelineError;
use crate::audio::frame;
use crate::audio::processor::{float_to_pcm, pcm_to_float};
use crate::audio::suppressor::NoiseSuppressor;
use crate::audio::{TELEPHONY_FRAME_LEN, TELEPHONY_SAMPLE_RATE};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

/// Summary of one `clean` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    /// Samples (bytes) received
    pub input_samples: usize,
    /// Samples (bytes) returned; the padded input length
    pub output_samples: usize,
    pub frames: usize,
    /// Frames that fell back to pass-through
    pub fallback_frames: usize,
    /// Mean suppressor confidence over cleaned frames
    pub mean_confidence: Option<f32>,
    /// Reserved; never derived from confidence, always false
    pub noise_detected: bool,
    pub processing_time_ms: u64,
}

/// μ-law in, cleaned μ-law out.
pub struct CleaningPipeline<S: NoiseSuppressor> {
    orchestrator: FrameOrchestrator,
    suppressor: S,
}

impl<S: NoiseSuppressor> CleaningPipeline<S> {
    pub fn new(suppressor: S) -> Self {
        Self {
            orchestrator: FrameOrchestrator::default(),
            suppressor,
        }
    }

    pub fn suppressor_name(&self) -> &str {
        self.suppressor.name()
    }

    /// Clean one burst of telephony audio.
    ///
    /// The output has `ceil(len / 80) * 80` bytes; the zero padding added to
    /// the last frame is cleaned and returned along with everything else.
    pub fn clean(&mut self, encoded: &[u8]) -> Result<(Vec<u8>, CleanReport), PipelineError> {
        let start_time = Instant::now();

        let linear = codec::decode(encoded);
        let normalized = pcm_to_float(&linear);

        let frames = frame::segment(&normalized, TELEPHONY_FRAME_LEN, TELEPHONY_SAMPLE_RATE)?;
        let padded = frame::concat(frames);

        let output: DenoiseOutput = self.orchestrator.process(&mut self.suppressor, &padded)?;

        let cleaned = codec::encode(&float_to_pcm(&output.samples));
        debug_assert_eq!(cleaned.len(), frame::padded_len(encoded.len(), TELEPHONY_FRAME_LEN));

        let report = CleanReport {
            input_samples: encoded.len(),
            output_samples: cleaned.len(),
            frames: output.frame_count(),
            fallback_frames: output.fallback_count(),
            mean_confidence: output.mean_confidence(),
            noise_detected: false,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        if report.fallback_frames > 0 {
            warn!(
                suppressor = self.suppressor.name(),
                frames = report.frames,
                fallback_frames = report.fallback_frames,
                "Some frames passed through without suppression"
            );
        }

        debug!(
            input_samples = report.input_samples,
            output_samples = report.output_samples,
            frames = report.frames,
            processing_time_ms = report.processing_time_ms,
            "Audio cleaned"
        );

        Ok((cleaned, report))
    }
}
