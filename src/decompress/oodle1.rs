//! Oodle1 stream driver.
//!
//! Expands one compressed stream into literals and back-references using a
//! fixed ensemble of adaptive models: 4 literal decoders keyed by the low two
//! bits of the output position, 65 repeat-length decoders keyed by the
//! previous length code, and three offset decoders that jointly encode a
//! back-reference distance at 1024-, 4- and 1-byte granularity.

use super::model::AdaptiveModel;
use super::range_coder::RangeDecoder;
use super::{DecompressError, Result};

/// Repeat lengths by length code. Code 0 selects a literal; codes 1..=60 map
/// to lengths 2..=61 and the top four codes skip ahead.
const REPEAT_LENGTHS: [u32; 65] = [
    0, 2, 3, 4, 5, 6, 7, 8, //
    9, 10, 11, 12, 13, 14, 15, 16, //
    17, 18, 19, 20, 21, 22, 23, 24, //
    25, 26, 27, 28, 29, 30, 31, 32, //
    33, 34, 35, 36, 37, 38, 39, 40, //
    41, 42, 43, 44, 45, 46, 47, 48, //
    49, 50, 51, 52, 53, 54, 55, 56, //
    57, 58, 59, 60, 61, 128, 192, 256, //
    512,
];

/// Byte length of the per-section header: three 32-bit words per stream,
/// three streams.
pub(crate) const SECTION_HEADER_LEN: usize = 36;

/// Decoder state for one stream of a section.
///
/// Built fresh at every stream boundary from the stream's header-word
/// triple; the shared [`RangeDecoder`] is borrowed into each call rather
/// than stored, so the bitstream survives across streams.
pub struct Oodle1Decoder {
    lit_decoders: Vec<AdaptiveModel>,
    len_decoders: Vec<AdaptiveModel>,
    off1_decoder: AdaptiveModel,
    off4_decoders: Vec<AdaptiveModel>,
    off1024_decoder: AdaptiveModel,
    window_size: u32,
    lit_alphabet_size: u32,
    offset1_alphabet_size: u32,
    bytes_output: u32,
    last_repeat_code: u32,
}

impl Oodle1Decoder {
    /// Build the decoder ensemble from one stream's header-word triple.
    ///
    /// `header[0]` packs the window size (bits 31:9) and the literal
    /// alphabet size (bits 8:0); `header[1]` the unique literal count
    /// (bits 8:0) and the largest 1K-offset bucket (bits 31:19);
    /// `header[2]` carries packed unique-symbol counts for the length
    /// decoders, one byte per group of 16.
    pub fn new(header: &[u32; 3]) -> Result<Self> {
        let window_size = header[0] >> 9;
        let lit_alphabet_size = header[0] & 0x1FF;
        if lit_alphabet_size == 0 {
            return Err(DecompressError::InvalidSectionHeader);
        }
        let unique_lit_count = header[1] & 0x1FF;
        let lit_decoders = (0..4)
            .map(|_| AdaptiveModel::new(lit_alphabet_size, unique_lit_count))
            .collect();

        let mut len_decoders = Vec::with_capacity(65);
        let mut rep_lens = header[2];
        for _group in 0..4 {
            for _ in 0..16 {
                len_decoders.push(AdaptiveModel::new(65, rep_lens >> 24));
            }
            rep_lens <<= 8;
        }
        len_decoders.push(AdaptiveModel::new(65, rep_lens >> 24));

        let offset1_alphabet_size = 4u32.min(window_size + 1);
        let offset4_alphabet_size = 256u32.min(window_size / 4 + 1);
        let offset1024_alphabet_size = window_size / 1024 + 1;
        let largest_1k_offset = header[1] >> 19;
        let off4_decoders = (0..256)
            .map(|_| AdaptiveModel::new(offset4_alphabet_size, offset4_alphabet_size))
            .collect();

        Ok(Self {
            lit_decoders,
            len_decoders,
            off1_decoder: AdaptiveModel::new(offset1_alphabet_size, offset1_alphabet_size),
            off4_decoders,
            off1024_decoder: AdaptiveModel::new(offset1024_alphabet_size, largest_1k_offset + 1),
            window_size,
            lit_alphabet_size,
            offset1_alphabet_size,
            bytes_output: 0,
            last_repeat_code: 0,
        })
    }

    /// Decode one literal or back-reference into `output` at `pos` and
    /// return the number of bytes emitted. `stop` is the active stream's
    /// stop offset; a back-reference may not carry past it.
    pub fn decompress(
        &mut self,
        bs: &mut RangeDecoder<'_>,
        output: &mut [u8],
        pos: usize,
        stop: usize,
    ) -> Result<usize> {
        let len_code = self.len_decoders[self.last_repeat_code as usize].decode(bs, 65)?;
        self.last_repeat_code = len_code;

        if len_code == 0 {
            let lit = self.lit_decoders[(self.bytes_output & 3) as usize]
                .decode(bs, self.lit_alphabet_size)?;
            output[pos] = lit as u8;
            self.bytes_output += 1;
            return Ok(1);
        }

        let len = REPEAT_LENGTHS[len_code as usize];
        let effective_window = self.window_size.min(self.bytes_output);
        let off1 = self.off1_decoder.decode(bs, self.offset1_alphabet_size)? + 1;
        let off1k = self.off1024_decoder.decode(bs, effective_window / 1024 + 1)?;
        let off4_decoder = self
            .off4_decoders
            .get_mut(off1k as usize)
            .ok_or(DecompressError::CorruptStream)?;
        let off4 = off4_decoder.decode(bs, 256u32.min(effective_window / 4 + 1))?;
        let offset = off1k * 1024 + off4 * 4 + off1;

        if offset == 0 || offset > self.bytes_output {
            return Err(DecompressError::InvalidBackReference {
                offset,
                position: self.bytes_output,
            });
        }
        if pos + len as usize > stop {
            return Err(DecompressError::OutputOverrun {
                position: self.bytes_output,
                length: len,
                stop: stop as u32,
            });
        }
        self.bytes_output += len;

        // Forward byte-at-a-time: when the offset is shorter than the
        // length, earlier-copied bytes are re-read (run-length expansion).
        let src = pos - offset as usize;
        for i in 0..len as usize {
            output[pos + i] = output[src + i];
        }
        Ok(len as usize)
    }
}

/// Decompress a complete Oodle1 section into a fresh buffer of `mem_size`
/// bytes.
///
/// `input` is the whole compressed section: nine little-endian header words
/// (one triple per stream) followed by the bitstream. The three streams stop
/// at `stream0_stop`, `stream1_stop` and `mem_size` respectively; an empty
/// stream still consumes its header triple.
pub fn decompress_section(
    input: &[u8],
    mem_size: usize,
    stream0_stop: usize,
    stream1_stop: usize,
) -> Result<Vec<u8>> {
    let mut output = vec![0u8; mem_size];
    decompress_section_into(input, &mut output, stream0_stop, stream1_stop)?;
    Ok(output)
}

/// Decompress a complete Oodle1 section into a caller-supplied buffer,
/// filling it entirely.
pub fn decompress_section_into(
    input: &[u8],
    output: &mut [u8],
    stream0_stop: usize,
    stream1_stop: usize,
) -> Result<()> {
    if input.len() < SECTION_HEADER_LEN {
        return Err(DecompressError::UnexpectedEof);
    }
    if stream0_stop > output.len() || stream1_stop > output.len() {
        return Err(DecompressError::InvalidSectionHeader);
    }
    let mut words = [0u32; 9];
    for (w, chunk) in words
        .iter_mut()
        .zip(input[..SECTION_HEADER_LEN].chunks_exact(4))
    {
        *w = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let mut bs = RangeDecoder::new(&input[SECTION_HEADER_LEN..])?;
    let stops = [stream0_stop, stream1_stop, output.len()];
    let mut pos = 0usize;
    for (stream, &stop) in stops.iter().enumerate() {
        if pos >= output.len() {
            break;
        }
        let triple = [words[stream * 3], words[stream * 3 + 1], words[stream * 3 + 2]];
        let mut decoder = Oodle1Decoder::new(&triple)?;
        while pos < stop {
            pos += decoder.decompress(&mut bs, output, pos, stop)?;
        }
    }
    Ok(())
}

#[cfg(any(test, feature = "synth"))]
impl Oodle1Decoder {
    /// Mirror of the literal path of [`decompress`](Self::decompress) for
    /// synthesizing streams.
    pub(crate) fn encode_literal(&mut self, w: &mut super::synth::StreamBuilder, lit: u8) {
        self.len_decoders[self.last_repeat_code as usize].encode(w, 0, 65);
        self.last_repeat_code = 0;
        self.lit_decoders[(self.bytes_output & 3) as usize].encode(
            w,
            u32::from(lit),
            self.lit_alphabet_size,
        );
        self.bytes_output += 1;
    }

    /// Mirror of the back-reference path of
    /// [`decompress`](Self::decompress). `len` must be a value of the
    /// repeat-length table and `offset` must decompose into the three
    /// offset granularities.
    pub(crate) fn encode_match(&mut self, w: &mut super::synth::StreamBuilder, offset: u32, len: u32) {
        let len_code = REPEAT_LENGTHS
            .iter()
            .position(|&l| l == len)
            .expect("length not representable") as u32;
        assert!(len_code != 0);
        self.len_decoders[self.last_repeat_code as usize].encode(w, len_code, 65);
        self.last_repeat_code = len_code;

        let off1 = (offset - 1) % 4 + 1;
        let rem = offset - off1;
        let off4 = rem % 1024 / 4;
        let off1k = rem / 1024;

        let effective_window = self.window_size.min(self.bytes_output);
        self.off1_decoder.encode(w, off1 - 1, self.offset1_alphabet_size);
        self.off1024_decoder.encode(w, off1k, effective_window / 1024 + 1);
        self.off4_decoders[off1k as usize].encode(
            w,
            off4,
            256u32.min(effective_window / 4 + 1),
        );
        self.bytes_output += len;
    }
}
