//! # G.711 μ-law Codec
//!
//! Bit-exact conversion between 8-bit μ-law telephony bytes and 16-bit linear
//! PCM. This is the wire format the telephony side decodes too, so there is no
//! tolerance anywhere in this file.
//!
//! ## Layout of a μ-law byte (after complementing):
//! ```text
//!   bit 7     bits 6..4    bits 3..0
//!   sign      exponent     mantissa
//! ```
//!
//! ## Two zeros:
//! μ-law has a positive zero (`0xFF`) and a negative zero (`0x7F`). Both decode
//! to linear `0`, and linear `0` always encodes to `0xFF`, so `0x7F` is the
//! single code that does not survive `encode(decode(b))`.

/// Bias added to the magnitude before the exponent search.
const MULAW_BIAS: i32 = 0x84;

/// Largest magnitude that can be represented once the bias is added.
const MULAW_CLIP: i32 = 32635;

/// The companded representation of linear zero.
#[cfg(test)]
pub const MULAW_SILENCE: u8 = 0xFF;

/// Decode one μ-law byte to a linear sample.
pub fn decode_sample(byte: u8) -> i16 {
    let byte = !byte;

    let sign = byte & 0x80;
    let exponent = (byte >> 4) & 0x07;
    let mantissa = byte & 0x0F;

    let magnitude = (((mantissa as i32) << 3) + MULAW_BIAS) << exponent;
    let magnitude = magnitude - MULAW_BIAS;

    if sign != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

/// Encode one linear sample to a μ-law byte.
pub fn encode_sample(sample: i16) -> u8 {
    let sample = sample as i32;
    let sign: u8 = if sample < 0 { 0x80 } else { 0x00 };

    // i32 so that |-32768| does not overflow
    let magnitude = sample.abs().min(MULAW_CLIP) + MULAW_BIAS;

    // Last threshold crossed wins
    let mut exponent: u8 = 0;
    for i in 0..7 {
        if magnitude >= (1 << (i + 8)) {
            exponent = i as u8 + 1;
        }
    }

    let mantissa = ((magnitude >> (exponent + 3)) & 0x0F) as u8;

    !(sign | (exponent << 4) | mantissa)
}

/// Decode a buffer of μ-law bytes into linear PCM, one sample per byte.
pub fn decode(encoded: &[u8]) -> Vec<i16> {
    encoded.iter().map(|&byte| decode_sample(byte)).collect()
}

/// Encode linear PCM into μ-law, one byte per sample.
pub fn encode(samples: &[i16]) -> Vec<u8> {
    samples.iter().map(|&sample| encode_sample(sample)).collect()
}
