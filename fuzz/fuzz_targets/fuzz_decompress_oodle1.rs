#![no_main]
use gr2_stream::decompress_section;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 12 {
        return;
    }

    // First 12 bytes pick the output size and stream stops (capped to 1MB
    // to avoid OOM); the rest is the section: header words + bitstream.
    let mem_size = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize % (1 << 20);
    let stream0_stop = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let stream1_stop = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;

    let section = &data[12..];
    let _ = decompress_section(section, mem_size, stream0_stop, stream1_stop);
});
