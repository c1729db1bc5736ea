//! Whole-file loading: section table traversal and memory-image assembly.

use crate::decompress::decompress_section_into;
use crate::error::{Gr2Error, Result};
use crate::parsing::{FileHeader, FileHeaderParser, SectionEncoding, SectionHeader};

/// A parsed Granny file with its reconstructed memory image.
///
/// Loading validates the header and section table, then rebuilds the memory
/// image section by section: raw sections are copied (zero-padded up to
/// their memory size), Oodle1 sections are decompressed in place. Sections
/// are laid out back to back in table order.
#[derive(Debug)]
pub struct GrannyFile {
    header: FileHeader,
    sections: Vec<SectionHeader>,
    /// Memory offset of each section within `data`.
    section_offsets: Vec<usize>,
    data: Vec<u8>,
}

impl GrannyFile {
    /// Parse a `.gr2` file and rebuild its memory image.
    pub fn load_from_bytes(raw: &[u8]) -> Result<Self> {
        let header = FileHeaderParser::parse(raw)?;
        if header.total_file_size as usize != raw.len() {
            return Err(Gr2Error::FileSizeMismatch {
                claimed: header.total_file_size,
                actual: raw.len(),
            });
        }

        let table_offset = header.section_offset as usize;
        let table_len = header.section_count as usize * SectionHeader::SIZE;
        let table_end = table_offset
            .checked_add(table_len)
            .ok_or(Gr2Error::InvalidHeader)?;
        if table_offset < FileHeaderParser::HEADER_SIZE
            || table_offset >= raw.len()
            || table_end > raw.len()
            || (header.total_header_size as usize) < table_end
        {
            return Err(Gr2Error::InvalidHeader);
        }

        let mut sections = Vec::with_capacity(header.section_count as usize);
        for idx in 0..header.section_count as usize {
            let record = &raw[table_offset + idx * SectionHeader::SIZE..];
            let section = SectionHeader::parse(record)?;
            section.validate(header.total_file_size)?;
            sections.push(section);
        }

        let total_mem: usize = sections.iter().map(|s| s.mem_size as usize).sum();
        let mut data = vec![0u8; total_mem];
        let mut section_offsets = Vec::with_capacity(sections.len());
        let mut mem_offset = 0usize;
        for section in &sections {
            section_offsets.push(mem_offset);
            if section.mem_size == 0 {
                continue;
            }
            let payload = &raw[section.file_offset as usize
                ..section.file_offset as usize + section.file_size as usize];
            let image = &mut data[mem_offset..mem_offset + section.mem_size as usize];
            match section.encoding {
                SectionEncoding::Raw => {
                    image[..payload.len()].copy_from_slice(payload);
                }
                SectionEncoding::Oodle1 => {
                    decompress_section_into(
                        payload,
                        image,
                        section.stream0_stop as usize,
                        section.stream1_stop as usize,
                    )?;
                }
                SectionEncoding::Oodle0 => {
                    return Err(Gr2Error::UnsupportedEncoding(section.encoding as u32));
                }
            }
            mem_offset += section.mem_size as usize;
        }

        Ok(Self {
            header,
            sections,
            section_offsets,
            data,
        })
    }

    /// The fixed file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// The parsed section table.
    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    /// The reconstructed memory image, all sections back to back.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// One section's slice of the memory image.
    pub fn section_data(&self, index: usize) -> Option<&[u8]> {
        let offset = *self.section_offsets.get(index)?;
        let len = self.sections[index].mem_size as usize;
        Some(&self.data[offset..offset + len])
    }
}
