//! Oodle1 decompression.
//!
//! This module decodes the Oodle1 compressed bitstream embedded in Granny
//! section payloads: an arithmetic (range) coder paired with adaptive symbol
//! models driving an LZ77-style literal/back-reference expander.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`RangeDecoder`] | Bit-level range-coder state over the compressed bytes |
//! | [`AdaptiveModel`] | Per-context symbol model with renormalization and decay |
//! | [`Oodle1Decoder`] | Literal/length/offset decoder ensemble for one stream |
//! | [`decompress_section`] | Three-stream section decode into a fresh buffer |
//!
//! ## Architecture
//!
//! ```text
//! Compressed Section
//!       ↓
//! ┌───────────────┐
//! │ RangeDecoder  │ ← shift register / modulus / pending bit
//! └───────────────┘
//!       ↓
//! ┌───────────────┐
//! │ AdaptiveModel │ ← probe, slot scan, occurrence update, renorm/decay
//! └───────────────┘
//!       ↓
//! ┌───────────────┐
//! │ Oodle1Decoder │ ← literals and overlapping back-reference copies
//! └───────────────┘
//!       ↓
//! Decompressed Section
//! ```
//!
//! A section multiplexes up to three independent streams over one bitstream:
//! each stream re-seeds the decoder ensemble from its own header-word triple
//! while the range-coder state flows straight through.

mod model;
mod oodle1;
mod range_coder;

#[cfg(any(test, feature = "synth"))]
pub mod synth;


pub use model::AdaptiveModel;
pub use oodle1::{decompress_section, decompress_section_into, Oodle1Decoder};
pub use range_coder::RangeDecoder;

use std::fmt;

/// Decompression errors.
///
/// All of these are fatal at the section level; the decoder performs no
/// recovery and the caller abandons the partial output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    /// The bitstream cursor would advance past the end of the compressed
    /// data, or the section is too short to hold its header words.
    UnexpectedEof,
    /// The section's header words or stream stops fail bounds checks
    /// (empty literal alphabet, stop offsets past the output buffer).
    InvalidSectionHeader,
    /// A decoded back-reference offset is zero or reaches before the
    /// start of the current stream.
    InvalidBackReference {
        /// The decoded offset.
        offset: u32,
        /// Bytes output so far in the current stream.
        position: u32,
    },
    /// A back-reference's length carries past the active stream stop.
    OutputOverrun {
        /// Output position at the start of the copy.
        position: u32,
        /// Decoded copy length.
        length: u32,
        /// The active stream's stop offset.
        stop: u32,
    },
    /// The adaptive model's symbol table was driven past its bounds;
    /// only reachable when header words misdeclare the alphabet.
    CorruptStream,
}

impl fmt::Display for DecompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "Unexpected end of compressed data"),
            Self::InvalidSectionHeader => write!(f, "Invalid section header words"),
            Self::InvalidBackReference { offset, position } => {
                write!(
                    f,
                    "Invalid back reference: offset {} exceeds stream position {}",
                    offset, position
                )
            }
            Self::OutputOverrun { position, length, stop } => {
                write!(
                    f,
                    "Back reference of length {} at position {} overruns stream stop {}",
                    length, position, stop
                )
            }
            Self::CorruptStream => write!(f, "Corrupt compressed stream"),
        }
    }
}

impl std::error::Error for DecompressError {}

pub type Result<T> = std::result::Result<T, DecompressError>;
