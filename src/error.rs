//! Error types for Granny container parsing and section decompression.
//!
//! This module provides the [`Gr2Error`] type which covers all possible errors
//! that can occur when parsing a `.gr2` file or rebuilding its memory image.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Format | [`InvalidSignature`], [`UnsupportedVersion`] | File is not a supported Granny file |
//! | Header | [`InvalidHeader`], [`FileSizeMismatch`], [`BufferTooSmall`] | Malformed fixed header |
//! | Sections | [`InvalidSectionBounds`], [`InvalidMemorySize`], [`InvalidRelocationTable`] | Section table fails bounds checks |
//! | Encoding | [`UnsupportedEncoding`], [`MarshallingNotSupported`] | Section uses a feature this crate does not decode |
//! | Decompression | [`Decompress`] | The Oodle1 bitstream could not be decoded |
//!
//! [`InvalidSignature`]: Gr2Error::InvalidSignature
//! [`UnsupportedVersion`]: Gr2Error::UnsupportedVersion
//! [`InvalidHeader`]: Gr2Error::InvalidHeader
//! [`FileSizeMismatch`]: Gr2Error::FileSizeMismatch
//! [`BufferTooSmall`]: Gr2Error::BufferTooSmall
//! [`InvalidSectionBounds`]: Gr2Error::InvalidSectionBounds
//! [`InvalidMemorySize`]: Gr2Error::InvalidMemorySize
//! [`InvalidRelocationTable`]: Gr2Error::InvalidRelocationTable
//! [`UnsupportedEncoding`]: Gr2Error::UnsupportedEncoding
//! [`MarshallingNotSupported`]: Gr2Error::MarshallingNotSupported
//! [`Decompress`]: Gr2Error::Decompress

use std::fmt;

use crate::decompress::DecompressError;

/// Error type for Granny file operations.
///
/// Covers every failure mode of [`GrannyFile::load_from_bytes`] and the
/// parsing entry points. Implements [`std::error::Error`]; decompression
/// failures are chained through [`source`].
///
/// [`GrannyFile::load_from_bytes`]: crate::GrannyFile::load_from_bytes
/// [`source`]: std::error::Error::source
#[derive(Debug)]
pub enum Gr2Error {
    /// The file does not start with the 16-byte Granny signature.
    InvalidSignature,

    /// The file header declares a version other than 6.
    ///
    /// Only version-6 containers (Granny 2.x era) are supported.
    UnsupportedVersion(u32),

    /// The header's `total_file_size` field disagrees with the actual
    /// byte count handed to the parser.
    FileSizeMismatch {
        /// Size claimed by the header.
        claimed: u32,
        /// Size of the provided buffer.
        actual: usize,
    },

    /// The provided buffer is too small to hold the structure being parsed.
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        have: usize,
    },

    /// The fixed header or section table is malformed (offsets point
    /// outside the file, or the declared header size does not cover the
    /// section table).
    InvalidHeader,

    /// A section's file offset/size range falls outside the file.
    InvalidSectionBounds {
        /// The section's file offset.
        offset: u32,
        /// The section's on-disk size.
        size: u32,
    },

    /// A section's decompressed size is smaller than its on-disk size.
    InvalidMemorySize {
        /// Declared decompressed size.
        mem_size: u32,
        /// Declared on-disk size.
        file_size: u32,
    },

    /// A section's relocation or marshalling table range falls outside
    /// the file (entries are 12 bytes each).
    InvalidRelocationTable {
        /// Table offset.
        offset: u32,
        /// Entry count.
        count: u32,
    },

    /// The section carries marshalling records, which this crate does not
    /// process. The `u32` is the record count.
    MarshallingNotSupported(u32),

    /// The section uses an encoding this crate cannot decode.
    ///
    /// The `u32` is the raw encoding tag: `0` Raw, `1` Oodle0 (obsolete,
    /// unsupported), `2` Oodle1. Values above `2` are unknown.
    UnsupportedEncoding(u32),

    /// Decoding a compressed section failed.
    Decompress(DecompressError),
}

impl fmt::Display for Gr2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "Invalid Granny signature"),
            Self::UnsupportedVersion(v) => write!(f, "Unsupported Granny version {}", v),
            Self::FileSizeMismatch { claimed, actual } => {
                write!(f, "File claims length {}, but is actually {}", claimed, actual)
            }
            Self::BufferTooSmall { needed, have } => {
                write!(f, "Buffer too small: need {} bytes, have {}", needed, have)
            }
            Self::InvalidHeader => write!(f, "Invalid or malformed header"),
            Self::InvalidSectionBounds { offset, size } => {
                write!(f, "Section file offset/size are invalid ({:08x} + {:x})", offset, size)
            }
            Self::InvalidMemorySize { mem_size, file_size } => {
                write!(
                    f,
                    "Section memory size {:x} is smaller than its file size {:x}",
                    mem_size, file_size
                )
            }
            Self::InvalidRelocationTable { offset, count } => {
                write!(
                    f,
                    "Section relocation table offset/size are invalid ({:08x} + {} entries)",
                    offset, count
                )
            }
            Self::MarshallingNotSupported(count) => {
                write!(f, "Section has {} marshalling records, which are unsupported", count)
            }
            Self::UnsupportedEncoding(e) => {
                write!(f, "Section uses unsupported encoding {}", e)
            }
            Self::Decompress(e) => write!(f, "Decompression failed: {}", e),
        }
    }
}

impl std::error::Error for Gr2Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decompress(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecompressError> for Gr2Error {
    fn from(e: DecompressError) -> Self {
        Self::Decompress(e)
    }
}

pub type Result<T> = std::result::Result<T, Gr2Error>;
