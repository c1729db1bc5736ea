//! File header parser - Granny signature and fixed header.
//!
//! A version-6 `.gr2` file opens with a 16-byte signature, the total header
//! size and 12 bytes of padding; the remaining fixed fields are relative to
//! the end of that padding (offset 32, the "data base").

use crate::error::{Gr2Error, Result};

/// Little-endian Granny file signature.
pub const GR2_SIGNATURE: [u8; 16] = [
    0xb8, 0x67, 0xb0, 0xca, 0xf8, 0x6d, 0xb1, 0x0f, //
    0x84, 0x72, 0x8c, 0x7e, 0x5e, 0x19, 0x00, 0x1e,
];

/// The only container version this crate decodes.
pub const SUPPORTED_VERSION: u32 = 6;

/// Fixed file header of a `.gr2` container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub total_header_size: u32,
    pub version: u32,
    pub total_file_size: u32,
    /// Header CRC as stored; read but never verified, matching the
    /// reference reader.
    pub crc: u32,
    /// Absolute offset of the section table (the on-disk field is
    /// relative to the data base).
    pub section_offset: u32,
    pub section_count: u32,
    pub root_node_type: u64,
    pub root_node_object: u64,
    pub user_tag: u32,
    pub user_data: [u8; 16],
}

pub struct FileHeaderParser;

impl FileHeaderParser {
    /// Offset where the versioned header begins (signature + total header
    /// size + 12 bytes padding).
    pub const DATA_BASE: usize = 32;
    /// Size of the fixed header through the user data block.
    pub const HEADER_SIZE: usize = 88;

    /// Parse the fixed header from the start of the file.
    pub fn parse(buffer: &[u8]) -> Result<FileHeader> {
        if buffer.len() < Self::HEADER_SIZE {
            return Err(Gr2Error::BufferTooSmall {
                needed: Self::HEADER_SIZE,
                have: buffer.len(),
            });
        }
        if buffer[..16] != GR2_SIGNATURE {
            return Err(Gr2Error::InvalidSignature);
        }

        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                buffer[offset],
                buffer[offset + 1],
                buffer[offset + 2],
                buffer[offset + 3],
            ])
        };
        let read_u64 = |offset: usize| {
            u64::from(read_u32(offset)) | (u64::from(read_u32(offset + 4)) << 32)
        };

        let total_header_size = read_u32(16);
        // 12 bytes of padding precede the data base.
        let version = read_u32(Self::DATA_BASE);
        if version != SUPPORTED_VERSION {
            return Err(Gr2Error::UnsupportedVersion(version));
        }
        let total_file_size = read_u32(36);
        let crc = read_u32(40);
        let section_offset = read_u32(44).wrapping_add(Self::DATA_BASE as u32);
        let section_count = read_u32(48);
        let root_node_type = read_u64(52);
        let root_node_object = read_u64(60);
        let user_tag = read_u32(68);
        let mut user_data = [0u8; 16];
        user_data.copy_from_slice(&buffer[72..88]);

        Ok(FileHeader {
            total_header_size,
            version,
            total_file_size,
            crc,
            section_offset,
            section_count,
            root_node_type,
            root_node_object,
            user_tag,
            user_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_header() -> Vec<u8> {
        let mut buf = vec![0u8; FileHeaderParser::HEADER_SIZE];
        buf[..16].copy_from_slice(&GR2_SIGNATURE);
        buf[16..20].copy_from_slice(&88u32.to_le_bytes());
        buf[32..36].copy_from_slice(&6u32.to_le_bytes());
        buf[36..40].copy_from_slice(&88u32.to_le_bytes());
        buf[44..48].copy_from_slice(&56u32.to_le_bytes()); // table right after header
        buf
    }

    #[test]
    fn test_parse_minimal() {
        let header = FileHeaderParser::parse(&minimal_header()).unwrap();
        assert_eq!(header.version, 6);
        assert_eq!(header.total_file_size, 88);
        assert_eq!(header.section_offset, 88); // 56 + data base
        assert_eq!(header.section_count, 0);
    }

    #[test]
    fn test_invalid_signature() {
        let mut buf = minimal_header();
        buf[0] ^= 0xFF;
        assert!(matches!(
            FileHeaderParser::parse(&buf),
            Err(Gr2Error::InvalidSignature)
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut buf = minimal_header();
        buf[32..36].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            FileHeaderParser::parse(&buf),
            Err(Gr2Error::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_buffer_too_small() {
        let buf = [0u8; 40];
        assert!(matches!(
            FileHeaderParser::parse(&buf),
            Err(Gr2Error::BufferTooSmall { needed: 88, have: 40 })
        ));
    }
}
