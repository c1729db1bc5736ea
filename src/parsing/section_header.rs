//! Section header parser.
//!
//! Each section in the table is a 44-byte record describing where the
//! payload sits in the file, how large its decompressed image is, and how
//! the payload is encoded.

use crate::error::{Gr2Error, Result};

/// Section payload encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SectionEncoding {
    /// Stored bytes, copied verbatim into the memory image.
    Raw = 0,
    /// Obsolete Oodle0 coder; recognized but not decoded.
    Oodle0 = 1,
    /// Oodle1 range-coded bitstream.
    Oodle1 = 2,
}

impl SectionEncoding {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Raw),
            1 => Some(Self::Oodle0),
            2 => Some(Self::Oodle1),
            _ => None,
        }
    }

    /// Whether this encoding requires running a decoder.
    pub fn needs_decompression(&self) -> bool {
        *self != Self::Raw
    }
}

/// One 44-byte section table record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    pub encoding: SectionEncoding,
    pub file_offset: u32,
    pub file_size: u32,
    /// Decompressed size; the section occupies this much of the memory
    /// image.
    pub mem_size: u32,
    pub alignment: u32,
    /// Switch from stream 0 to stream 1 after decompressing this many
    /// bytes.
    pub stream0_stop: u32,
    /// Switch from stream 1 to stream 2 after decompressing this many
    /// bytes.
    pub stream1_stop: u32,
    pub reloc_offset: u32,
    pub reloc_count: u32,
    pub marshal_offset: u32,
    pub marshal_count: u32,
}

impl SectionHeader {
    /// On-disk record size.
    pub const SIZE: usize = 44;

    /// Parse one record.
    pub fn parse(buffer: &[u8]) -> Result<SectionHeader> {
        if buffer.len() < Self::SIZE {
            return Err(Gr2Error::BufferTooSmall {
                needed: Self::SIZE,
                have: buffer.len(),
            });
        }
        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                buffer[offset],
                buffer[offset + 1],
                buffer[offset + 2],
                buffer[offset + 3],
            ])
        };
        let raw_encoding = read_u32(0);
        let encoding = SectionEncoding::from_u32(raw_encoding)
            .ok_or(Gr2Error::UnsupportedEncoding(raw_encoding))?;
        Ok(SectionHeader {
            encoding,
            file_offset: read_u32(4),
            file_size: read_u32(8),
            mem_size: read_u32(12),
            alignment: read_u32(16),
            stream0_stop: read_u32(20),
            stream1_stop: read_u32(24),
            reloc_offset: read_u32(28),
            reloc_count: read_u32(32),
            marshal_offset: read_u32(36),
            marshal_count: read_u32(40),
        })
    }

    /// Bounds-check the record against the file it came from.
    ///
    /// Relocation tables are validated but never applied; marshalling
    /// records are rejected outright. Arithmetic is done in 64 bits so
    /// hostile offsets cannot wrap.
    pub fn validate(&self, total_file_size: u32) -> Result<()> {
        let total = u64::from(total_file_size);
        if u64::from(self.file_offset) > total
            || u64::from(self.file_offset) + u64::from(self.file_size) > total
        {
            return Err(Gr2Error::InvalidSectionBounds {
                offset: self.file_offset,
                size: self.file_size,
            });
        }
        if self.mem_size < self.file_size {
            return Err(Gr2Error::InvalidMemorySize {
                mem_size: self.mem_size,
                file_size: self.file_size,
            });
        }
        if u64::from(self.reloc_offset) > total
            || u64::from(self.reloc_offset) + u64::from(self.reloc_count) * 12 > total
        {
            return Err(Gr2Error::InvalidRelocationTable {
                offset: self.reloc_offset,
                count: self.reloc_count,
            });
        }
        if u64::from(self.marshal_offset) > total
            || u64::from(self.marshal_offset) + u64::from(self.marshal_count) * 12 > total
        {
            return Err(Gr2Error::InvalidRelocationTable {
                offset: self.marshal_offset,
                count: self.marshal_count,
            });
        }
        if self.marshal_count > 0 {
            return Err(Gr2Error::MarshallingNotSupported(self.marshal_count));
        }
        Ok(())
    }
}
