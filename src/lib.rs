//! Granny (.gr2) container parsing and Oodle1 decompression.
//!
//! Rust implementation of the version-6 Granny container format with a
//! bit-exact decoder for its Oodle1 compressed sections: a range-coder
//! bitstream driving adaptive symbol models through an LZ77-style expander.
//!
//! ## Section Encodings
//!
//! Granny tags each section with a 32-bit encoding value:
//!
//! | Value | Name | Description |
//! |-------|------|-------------|
//! | `0` | Raw | Stored bytes, copied into the memory image as-is |
//! | `1` | Oodle0 | Obsolete coder - recognized, not decoded |
//! | `2` | Oodle1 | Adaptive range-coded bitstream (this crate's core) |
//!
//! ## Example
//!
//! ```rust,ignore
//! use gr2_stream::GrannyFile;
//!
//! let raw = std::fs::read("model.gr2")?;
//! let file = GrannyFile::load_from_bytes(&raw)?;
//! println!("{} sections, {} bytes", file.sections().len(), file.data().len());
//! ```
//!
//! Sections can also be decoded directly when the container is handled
//! elsewhere: [`decompress_section`] takes the compressed payload (nine
//! header words plus the bitstream) and the stream stop offsets from the
//! section table.
//!
//! ## Scope
//!
//! Decoding only: there is no encoder, no seeking within a stream, and no
//! relocation or marshalling processing. Oodle0 sections are rejected.

pub mod decompress;
pub mod error;
pub mod parsing;

mod granny_file;

pub use error::Gr2Error;
pub use granny_file::GrannyFile;

// Re-export decompression types
pub use decompress::{
    decompress_section, decompress_section_into, AdaptiveModel, DecompressError, Oodle1Decoder,
    RangeDecoder,
};
pub use parsing::{SectionEncoding, SectionHeader};
