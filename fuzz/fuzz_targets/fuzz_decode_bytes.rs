#![no_main]

use libfuzzer_sys::fuzz_target;
use teleinfo_rs::teleinfo::frame::{checksum, decode_bytes};

fuzz_target!(|data: &[u8]| {
    // Words never contain the separator, and checksums stay printable
    for record in decode_bytes(data) {
        assert!(!record.label.contains(' '));
        assert!(!record.value.contains(' '));
        assert!((0x20..0x60).contains(&checksum(&record.label, &record.value)));
    }

    // Stripping the parity bits must not make the decoder panic either
    let stripped: Vec<u8> = data.iter().map(|b| b & 0x7F).collect();
    let _ = decode_bytes(&stripped);
});
