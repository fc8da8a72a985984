//! # Telephony Audio Cleaning Core
//!
//! Everything needed to turn a burst of 8 kHz μ-law telephony audio into the
//! same audio with background noise suppressed, ready to go back down the
//! same channel.
//!
//! ## Pipeline:
//! ```text
//! μ-law bytes → codec::decode → normalize → frame::segment(80)
//!     → for each frame: resample up (480 @ 48kHz) → suppressor → resample down (80)
//!     → concatenate → denormalize → codec::encode → μ-law bytes
//! ```
//!
//! ## Key Components:
//! - **codec**: Bit-exact G.711 μ-law companding in both directions
//! - **resample**: Fixed ratio (×6) linear-interpolation upsampler and decimating downsampler
//! - **frame**: 10ms frames and the zero-padding segmenter
//! - **processor**: Payload validation and i16 ↔ f32 sample conversion
//! - **suppressor**: The pluggable noise suppression capability (RNNoise by default)
//! - **denoise**: Per-frame orchestration with pass-through fallback
//! - **pipeline**: The one-call facade used by the HTTP layer
//!
//! Nothing in this module performs I/O or holds state across calls except the
//! suppressor instance handed to the pipeline.

pub mod codec;        // G.711 μ-law encode/decode
pub mod denoise;      // Frame orchestrator with per-frame fallback
pub mod error;        // Core error types
pub mod frame;        // Frame type and segmenter
pub mod pipeline;     // encoded-in → encoded-out facade
pub mod processor;    // Payload validation and sample conversion
pub mod resample;     // 8 kHz ↔ 48 kHz frame resampler
pub mod suppressor;   // Noise suppression capability

pub use error::PipelineError;
pub use pipeline::CleaningPipeline;
pub use suppressor::{build_suppressor, NoiseSuppressor};

/// Telephony sample rate (Hz).
pub const TELEPHONY_SAMPLE_RATE: u32 = 8000;

/// Sample rate required by the suppression model (Hz).
pub const MODEL_SAMPLE_RATE: u32 = 48000;

/// Samples in one 10ms frame at the telephony rate.
pub const TELEPHONY_FRAME_LEN: usize = 80;

/// Samples in one 10ms frame at the model rate.
pub const MODEL_FRAME_LEN: usize = 480;

/// Integer ratio between the two rates.
pub const RESAMPLE_RATIO: usize = MODEL_FRAME_LEN / TELEPHONY_FRAME_LEN;
