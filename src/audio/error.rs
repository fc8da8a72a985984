use thiserror::Error;

/// Failures inside the cleaning core.
///
/// All of these are contract violations (a frame of the wrong size or rate
/// reached a stage that cannot accept it). Per-frame suppression failures are
/// not represented here; the orchestrator absorbs them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("frame length mismatch at {stage}: expected {expected} samples, got {actual}")]
    FrameLength {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("sample rate mismatch at {stage}: expected {expected} Hz, got {actual} Hz")]
    SampleRate {
        stage: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("invalid frame length: {0}")]
    InvalidFrameLength(usize),
}
