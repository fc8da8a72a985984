//! # Frame Resampler
//!
//! Converts single frames between the telephony rate and the model rate using
//! a fixed integer ratio.
//!
//! - **Up**: linear interpolation. Target positions are spread evenly over
//!   `[0, len - 1]` of the source, so both endpoints map exactly.
//! - **Down**: plain decimation, `out[i] = in[ratio * i]`. No anti-aliasing
//!   filter is applied; adding one would change every cleaned output.
//!
//! The resampler holds no state between calls.

use crate::audio::error::PipelineError;
use crate::audio::frame::Frame;
use crate::audio::{
    MODEL_SAMPLE_RATE, RESAMPLE_RATIO, TELEPHONY_FRAME_LEN, TELEPHONY_SAMPLE_RATE,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resampler {
    low_rate: u32,
    low_len: usize,
    ratio: usize,
}

impl Default for Resampler {
    fn default() -> Self {
        Self::telephony()
    }
}

impl Resampler {
    /// 80 samples @ 8 kHz ↔ 480 samples @ 48 kHz.
    pub fn telephony() -> Self {
        Self {
            low_rate: TELEPHONY_SAMPLE_RATE,
            low_len: TELEPHONY_FRAME_LEN,
            ratio: RESAMPLE_RATIO,
        }
    }

    pub fn high_rate(&self) -> u32 {
        self.low_rate * self.ratio as u32
    }

    pub fn high_len(&self) -> usize {
        self.low_len * self.ratio
    }

    /// Linear-interpolation upsampling of one low-rate frame.
    pub fn upsample(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        frame.expect_shape("upsample", self.low_rate, self.low_len)?;

        let source = frame.samples();
        let out_len = self.high_len();
        let last = (self.low_len - 1) as f64;
        let step = last / (out_len - 1) as f64;

        let samples = (0..out_len)
            .map(|j| {
                let position = j as f64 * step;
                let index = (position.floor() as usize).min(self.low_len - 1);
                if index == self.low_len - 1 {
                    return source[index];
                }
                let fraction = (position - index as f64) as f32;
                let left = source[index];
                let right = source[index + 1];
                left + (right - left) * fraction
            })
            .collect();

        Ok(Frame::new(self.high_rate(), samples))
    }

    /// Decimate one high-rate frame back to the low rate.
    pub fn downsample(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        frame.expect_shape("downsample", self.high_rate(), self.high_len())?;

        let samples = frame
            .samples()
            .iter()
            .step_by(self.ratio)
            .copied()
            .collect();

        Ok(Frame::new(self.low_rate, samples))
    }
}

// Compile-time sanity: the two constants must agree
const _: () = assert!(TELEPHONY_SAMPLE_RATE * RESAMPLE_RATIO as u32 == MODEL_SAMPLE_RATE);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MODEL_FRAME_LEN;

    fn ramp() -> Frame {
        let samples = (0..TELEPHONY_FRAME_LEN)
            .map(|i| (i as f32 / 40.0) - 1.0)
            .collect();
        Frame::new(TELEPHONY_SAMPLE_RATE, samples)
    }

    #[test]
    fn test_lengths_and_rates() {
        let resampler = Resampler::telephony();
        let up = resampler.upsample(&ramp()).unwrap();
        assert_eq!(up.len(), MODEL_FRAME_LEN);
        assert_eq!(up.sample_rate(), MODEL_SAMPLE_RATE);

        let down = resampler.downsample(&up).unwrap();
        assert_eq!(down.len(), TELEPHONY_FRAME_LEN);
        assert_eq!(down.sample_rate(), TELEPHONY_SAMPLE_RATE);
    }

    #[test]
    fn test_upsample_preserves_endpoints() {
        let frame = ramp();
        let up = Resampler::telephony().upsample(&frame).unwrap();
        assert!((up.samples()[0] - frame.samples()[0]).abs() < 1e-6);
        assert!((up.samples()[479] - frame.samples()[79]).abs() < 1e-6);
    }

    #[test]
    fn test_upsample_interpolates_linearly() {
        // A ramp stays a ramp under linear interpolation
        let frame = ramp();
        let up = Resampler::telephony().upsample(&frame).unwrap();
        for (j, &value) in up.samples().iter().enumerate() {
            let position = j as f32 * 79.0 / 479.0;
            let expected = position / 40.0 - 1.0;
            assert!((value - expected).abs() < 1e-5, "sample {}: {} vs {}", j, value, expected);
        }
    }

    #[test]
    fn test_constant_frame_survives_round_trip() {
        let frame = Frame::new(TELEPHONY_SAMPLE_RATE, vec![0.5; TELEPHONY_FRAME_LEN]);
        let resampler = Resampler::telephony();
        let back = resampler
            .downsample(&resampler.upsample(&frame).unwrap())
            .unwrap();
        assert!(back.samples().iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_downsample_takes_every_sixth_sample() {
        let samples: Vec<f32> = (0..MODEL_FRAME_LEN).map(|i| i as f32).collect();
        let frame = Frame::new(MODEL_SAMPLE_RATE, samples);
        let down = Resampler::telephony().downsample(&frame).unwrap();
        for (i, &value) in down.samples().iter().enumerate() {
            assert_eq!(value, (6 * i) as f32);
        }
    }

    #[test]
    fn test_wrong_shapes_are_rejected() {
        let resampler = Resampler::telephony();
        let short = Frame::new(TELEPHONY_SAMPLE_RATE, vec![0.0; 79]);
        assert!(matches!(
            resampler.upsample(&short),
            Err(PipelineError::FrameLength { stage: "upsample", .. })
        ));

        let wrong_rate = Frame::new(16000, vec![0.0; MODEL_FRAME_LEN]);
        assert!(matches!(
            resampler.downsample(&wrong_rate),
            Err(PipelineError::SampleRate { stage: "downsample", .. })
        ));
    }
}
