//! # Frames and Segmentation
//!
//! A frame is a fixed 10ms window of normalized samples at a declared rate:
//! 80 samples at 8 kHz, 480 at 48 kHz. The segmenter cuts a sample buffer into
//! telephony frames and zero-pads the last one.
//!
//! ## Padding policy:
//! The padding is never trimmed again. Output always has the padded length,
//! `ceil(len / 80) * 80`, and the padded tail goes through the pipeline like
//! any other audio.

use crate::audio::error::PipelineError;

/// A fixed-length window of normalized samples at a declared sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl Frame {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Fail unless this frame has exactly `len` samples at `sample_rate`.
    pub fn expect_shape(
        &self,
        stage: &'static str,
        sample_rate: u32,
        len: usize,
    ) -> Result<(), PipelineError> {
        if self.sample_rate != sample_rate {
            return Err(PipelineError::SampleRate {
                stage,
                expected: sample_rate,
                actual: self.sample_rate,
            });
        }
        if self.samples.len() != len {
            return Err(PipelineError::FrameLength {
                stage,
                expected: len,
                actual: self.samples.len(),
            });
        }
        Ok(())
    }
}

/// Number of zeros needed to bring `len` up to a multiple of `frame_len`.
pub fn padding_for(len: usize, frame_len: usize) -> usize {
    match len % frame_len {
        0 => 0,
        remainder => frame_len - remainder,
    }
}

/// Length after padding: `ceil(len / frame_len) * frame_len`.
pub fn padded_len(len: usize, frame_len: usize) -> usize {
    len + padding_for(len, frame_len)
}

/// Split `samples` into frames of `frame_len`, zero-padding the final frame.
///
/// An empty input produces no frames.
pub fn segment(
    samples: &[f32],
    frame_len: usize,
    sample_rate: u32,
) -> Result<Vec<Frame>, PipelineError> {
    if frame_len == 0 {
        return Err(PipelineError::InvalidFrameLength(frame_len));
    }

    let frames = samples
        .chunks(frame_len)
        .map(|chunk| {
            let mut window = Vec::with_capacity(frame_len);
            window.extend_from_slice(chunk);
            window.resize(frame_len, 0.0);
            Frame::new(sample_rate, window)
        })
        .collect();

    Ok(frames)
}

/// Concatenate frames back into one sample buffer.
pub fn concat(frames: Vec<Frame>) -> Vec<f32> {
    let total = frames.iter().map(Frame::len).sum();
    let mut samples = Vec::with_capacity(total);
    for frame in frames {
        samples.extend(frame.into_samples());
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{TELEPHONY_FRAME_LEN, TELEPHONY_SAMPLE_RATE};

    #[test]
    fn test_padding_amounts() {
        assert_eq!(padding_for(0, 80), 0);
        assert_eq!(padding_for(80, 80), 0);
        assert_eq!(padding_for(100, 80), 60);
        assert_eq!(padding_for(1, 80), 79);
        assert_eq!(padded_len(100, 80), 160);
        assert_eq!(padded_len(160, 80), 160);
    }

    #[test]
    fn test_segment_pads_last_frame_with_zeros() {
        let samples: Vec<f32> = (0..100).map(|i| (i as f32 + 1.0) / 200.0).collect();
        let frames = segment(&samples, TELEPHONY_FRAME_LEN, TELEPHONY_SAMPLE_RATE).unwrap();

        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.len() == TELEPHONY_FRAME_LEN));
        assert!(frames.iter().all(|f| f.sample_rate() == TELEPHONY_SAMPLE_RATE));

        let flat = concat(frames);
        assert_eq!(flat.len(), 160);
        assert_eq!(&flat[..100], &samples[..]);
        assert!(flat[100..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_segment_lengths_follow_ceiling() {
        for len in [0usize, 1, 79, 80, 81, 159, 160, 161, 1000] {
            let samples = vec![0.25f32; len];
            let frames = segment(&samples, 80, 8000).unwrap();
            let total: usize = frames.iter().map(Frame::len).sum();
            assert_eq!(total, (len + 79) / 80 * 80, "input length {}", len);
        }
    }

    #[test]
    fn test_segment_rejects_zero_frame_length() {
        assert_eq!(
            segment(&[0.0; 4], 0, 8000),
            Err(PipelineError::InvalidFrameLength(0))
        );
    }

    #[test]
    fn test_expect_shape() {
        let frame = Frame::new(8000, vec![0.0; 80]);
        assert!(frame.expect_shape("test", 8000, 80).is_ok());
        assert!(matches!(
            frame.expect_shape("test", 48000, 80),
            Err(PipelineError::SampleRate { .. })
        ));
        assert!(matches!(
            frame.expect_shape("test", 8000, 480),
            Err(PipelineError::FrameLength { expected: 480, actual: 80, .. })
        ));
    }
}
