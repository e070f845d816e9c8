//! PCM byte encoding.

/// Byte format a device expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PcmFormat {
    /// Signed 16-bit little-endian.
    #[default]
    I16,
    /// IEEE 754 32-bit float little-endian.
    F32,
}

impl PcmFormat {
    /// Encoded size of one sample.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::I16 => 2,
            Self::F32 => 4,
        }
    }

    /// Bit depth of one sample.
    pub fn bits_per_sample(self) -> u16 {
        match self {
            Self::I16 => 16,
            Self::F32 => 32,
        }
    }

    /// Appends the encoding of `x`, clamped to `[-1, 1]`, to `out`.
    #[inline]
    pub fn encode(self, x: f64, out: &mut Vec<u8>) {
        // NaN clamps to NaN; map it to silence instead of letting the cast
        // pick a value.
        let x = if x.is_nan() { 0.0 } else { x.clamp(-1.0, 1.0) };
        match self {
            Self::I16 => out.extend_from_slice(&((x * f64::from(i16::MAX)) as i16).to_le_bytes()),
            Self::F32 => out.extend_from_slice(&(x as f32).to_le_bytes()),
        }
    }

    /// Appends the encoding of every sample in `block` to `out`.
    pub fn encode_block(self, block: &[f64], out: &mut Vec<u8>) {
        out.reserve(block.len() * self.bytes_per_sample());
        for &x in block {
            self.encode(x, out);
        }
    }
}
