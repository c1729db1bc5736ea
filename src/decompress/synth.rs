//! Synthetic Oodle1 stream construction.
//!
//! Test and benchmark support: no recorded Granny fixtures ship with this
//! repository, so decoder inputs are built by running the exact interval
//! arithmetic of [`RangeDecoder`](super::RangeDecoder) in reverse. The
//! builder tracks the accumulated range low as an arbitrary-precision byte
//! string, mirroring the decoder's refill schedule; the finished bytes are
//! that low bound, which the decoder provably maps back to the pushed slots.
//!
//! This is deliberately not a compression API: model mirroring lives in
//! `cfg`-gated `encode` methods beside the real decode paths, and the whole
//! module is compiled only for tests and the `synth` feature.

use super::oodle1::SECTION_HEADER_LEN;

/// Accumulates range-coder intervals and renders the byte stream that
/// decodes back to them.
pub struct StreamBuilder {
    /// Big-endian accumulated low; digit 0 carries the leading 7 bits.
    low: Vec<u8>,
    modulus: u32,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self {
            low: vec![0],
            modulus: 0x80,
        }
    }

    /// Mirror of the decoder's refill: one digit per ingested byte.
    fn ingest(&mut self) {
        while self.modulus <= 0x80_0000 {
            self.low.push(0);
            self.modulus <<= 8;
        }
    }

    /// Add `amount` (in units of the current least-significant digit) into
    /// the accumulated low, propagating carries. The range invariant keeps
    /// carries from ever escaping the leading digit.
    fn add_low(&mut self, mut amount: u64) {
        let mut i = self.low.len();
        while amount > 0 {
            i -= 1;
            let v = u64::from(self.low[i]) + (amount & 0xFF);
            self.low[i] = (v & 0xFF) as u8;
            amount = (amount >> 8) + (v >> 8);
        }
        debug_assert!(self.low[0] < 0x80);
    }

    /// Mirror of `peek` + `consume`: select the slot
    /// `[min_z, min_z + span_z)` out of `one`.
    pub fn push(&mut self, min_z: u32, span_z: u32, one: u32) {
        self.ingest();
        let scale = self.modulus / one;
        self.add_low(u64::from(min_z) * u64::from(scale));
        if min_z < one - span_z {
            self.modulus = span_z * scale;
        } else {
            self.modulus -= min_z * scale;
        }
    }

    /// Mirror of `get`: select the single slot `z` out of `one`.
    pub fn put(&mut self, z: u32, one: u32) {
        self.push(z, 1, one);
    }

    /// Render the byte stream: the accumulated low shifted up one bit, so
    /// the decoder's register (which trails the cursor by the pending bit)
    /// lands exactly on it.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.low.len());
        for i in 0..self.low.len() {
            let hi = self.low[i] << 1;
            let lo = if i + 1 < self.low.len() {
                self.low[i + 1] >> 7
            } else {
                0
            };
            out.push(hi | lo);
        }
        out
    }
}

impl Default for StreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble a full compressed section: nine little-endian header words
/// followed by the bitstream payload.
pub fn section_bytes(words: &[u32; 9], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SECTION_HEADER_LEN + payload.len());
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out.extend_from_slice(payload);
    out
}

/// Header-word triple for a stream: window size, literal alphabet and
/// unique-count fields packed the way the decoder unpacks them.
/// `len_unique` seeds all four length-decoder groups with the same count.
pub fn stream_header(
    window_size: u32,
    lit_alphabet: u32,
    unique_lits: u32,
    largest_1k: u32,
    len_unique: u8,
) -> [u32; 3] {
    [
        (window_size << 9) | (lit_alphabet & 0x1FF),
        (largest_1k << 19) | (unique_lits & 0x1FF),
        u32::from_le_bytes([len_unique; 4]),
    ]
}

#[cfg(test)]
mod tests {
    use super::super::range_coder::RangeDecoder;
    use super::*;

    #[test]
    fn test_empty_stream_is_one_byte() {
        let data = StreamBuilder::new().finish();
        assert_eq!(data, vec![0]);
        assert!(RangeDecoder::new(&data).is_ok());
    }

    #[test]
    fn test_single_get_roundtrip() {
        for z in 0..16u32 {
            let mut w = StreamBuilder::new();
            w.put(z, 16);
            let data = w.finish();
            let mut bs = RangeDecoder::new(&data).unwrap();
            assert_eq!(bs.get(16).unwrap(), z);
        }
    }

    #[test]
    fn test_get_sequence_roundtrip() {
        let ops: [(u32, u32); 12] = [
            (3, 7),
            (0, 2),
            (1, 2),
            (64, 65),
            (0, 65),
            (200, 256),
            (0x3FFF, 0x4000),
            (0, 0x4000),
            (5, 9),
            (1, 3),
            (511, 512),
            (2, 4),
        ];
        let mut w = StreamBuilder::new();
        for &(z, one) in &ops {
            w.put(z, one);
        }
        let data = w.finish();
        let mut bs = RangeDecoder::new(&data).unwrap();
        for &(z, one) in &ops {
            assert_eq!(bs.get(one).unwrap(), z);
        }
    }

    #[test]
    fn test_peek_consume_roundtrip() {
        // Slot boundaries as an adaptive model would produce them.
        let slots: [(u32, u32); 6] = [
            (0, 0x1000),
            (0x1000, 0x2400),
            (0x3400, 0x0C00),
            (0, 0x4000),
            (0x2000, 0x2000),
            (0x100, 0x80),
        ];
        let mut w = StreamBuilder::new();
        for &(min_z, span_z) in &slots {
            w.push(min_z, span_z, 0x4000);
        }
        let data = w.finish();
        let mut bs = RangeDecoder::new(&data).unwrap();
        for &(min_z, span_z) in &slots {
            let z = bs.peek(0x4000).unwrap();
            assert!(z >= min_z && z < min_z + span_z, "z {:#x} outside slot", z);
            bs.consume(min_z, span_z, 0x4000);
        }
    }
}
