//! Fuzz target for single-line label parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run label_line_parse

#![no_main]

use cavelabel::store::fuzz_parse_label_line;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    let _ = fuzz_parse_label_line(line);
});
