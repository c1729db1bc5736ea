#![no_main]
use gr2_stream::parsing::{FileHeaderParser, SectionHeader};
use gr2_stream::GrannyFile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Pre-scan the section table and skip inputs whose memory image would
    // not fit in 16MB; a fuzzed mem_size field can otherwise demand
    // gigabytes.
    let Ok(header) = FileHeaderParser::parse(data) else {
        return;
    };
    let table_offset = header.section_offset as usize;
    let mut total_mem = 0u64;
    for idx in 0..header.section_count as usize {
        let record_offset = table_offset + idx * SectionHeader::SIZE;
        let Some(record) = data.get(record_offset..) else {
            break;
        };
        let Ok(section) = SectionHeader::parse(record) else {
            break;
        };
        total_mem += u64::from(section.mem_size);
    }
    if total_mem > 16 * 1024 * 1024 {
        return;
    }

    let _ = GrannyFile::load_from_bytes(data);
});
