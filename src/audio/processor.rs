//! # Payload Validation and Sample Conversion
//!
//! Checks incoming telephony payloads before they reach the pipeline and
//! converts between linear PCM and the normalized float representation the
//! resampler and suppressor work in.
//!
//! ## Key Functions:
//! - **Payload validation**: Declared sample rate, empty payloads, size limit
//! - **Normalization**: i16 → f32 in [-1.0, 1.0], scale 1/32768
//! - **Denormalization**: f32 → i16, scale 32768, rounded and clipped

use crate::audio::TELEPHONY_SAMPLE_RATE;

/// Scale between linear PCM and normalized samples.
pub const PCM_SCALE: f32 = 32768.0;

/// Validates telephony payloads against the service's accepted format.
#[derive(Debug, Clone)]
pub struct AudioProcessor {
    sample_rate: u32,
    max_payload_bytes: usize,
}

impl Default for AudioProcessor {
    fn default() -> Self {
        Self::new(TELEPHONY_SAMPLE_RATE, 160_000)
    }
}

impl AudioProcessor {
    pub fn new(sample_rate: u32, max_payload_bytes: usize) -> Self {
        Self {
            sample_rate,
            max_payload_bytes,
        }
    }

    /// Check the sample rate a client declared for its payload.
    ///
    /// Only the telephony rate is accepted; anything else would make the
    /// fixed 80-sample framing wrong.
    pub fn validate_sample_rate(&self, declared: u32) -> Result<(), String> {
        if declared != self.sample_rate {
            return Err(format!(
                "Sample rate mismatch: expected {}, got {}",
                self.sample_rate, declared
            ));
        }
        Ok(())
    }

    /// Check a decoded μ-law payload (one byte per sample).
    pub fn validate_payload(&self, data: &[u8]) -> Result<(), String> {
        if data.is_empty() {
            return Err("Audio payload is empty".to_string());
        }

        if data.len() > self.max_payload_bytes {
            return Err(format!(
                "Audio payload too large: {} bytes (maximum: {})",
                data.len(),
                self.max_payload_bytes
            ));
        }

        Ok(())
    }

    /// Duration of a μ-law payload in milliseconds.
    pub fn duration_ms(&self, data: &[u8]) -> f64 {
        data.len() as f64 * 1000.0 / self.sample_rate as f64
    }
}

/// Convert linear PCM to normalized floats.
pub fn pcm_to_float(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&sample| sample as f32 / PCM_SCALE).collect()
}

/// Convert normalized floats back to linear PCM.
///
/// Values are rounded to the nearest integer and clipped to the i16 range, so
/// a full-scale `1.0` becomes `32767`.
pub fn float_to_pcm(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&sample| {
            let scaled = (sample * PCM_SCALE).round();
            scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_validation() {
        let processor = AudioProcessor::default();
        assert!(processor.validate_sample_rate(8000).is_ok());
        assert!(processor.validate_sample_rate(16000).is_err());
    }

    #[test]
    fn test_payload_validation() {
        let processor = AudioProcessor::new(8000, 320);
        assert!(processor.validate_payload(&[0xFF; 160]).is_ok());
        assert!(processor.validate_payload(&[0xFF; 320]).is_ok());
        assert!(processor.validate_payload(&[]).is_err());

        let err = processor.validate_payload(&[0xFF; 321]).unwrap_err();
        assert!(err.contains("too large"));
    }

    #[test]
    fn test_duration() {
        let processor = AudioProcessor::default();
        assert_eq!(processor.duration_ms(&[0u8; 160]), 20.0);
    }

    #[test]
    fn test_pcm_conversion() {
        let pcm_samples = vec![0i16, 16384, -16384, 32767, -32768, 1, -1];
        let float_samples = pcm_to_float(&pcm_samples);
        assert_eq!(float_samples[1], 0.5);
        assert_eq!(float_samples[4], -1.0);

        // Power-of-two scale makes the round trip exact
        assert_eq!(float_to_pcm(&float_samples), pcm_samples);
    }

    #[test]
    fn test_float_to_pcm_rounds_and_clips() {
        let converted = float_to_pcm(&[1.0, -1.5, 2.0 / PCM_SCALE * 0.74, -0.6 / PCM_SCALE]);
        assert_eq!(converted, vec![32767, -32768, 1, -1]);
    }
}
