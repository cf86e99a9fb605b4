//! Fuzz target for the control line parser
//!
//! Arbitrary text must parse or be rejected with an error, never panic.
//! Accepted lines must survive a second parse of their trimmed form.

#![no_main]

use devstated::control::parse_line;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for line in text.lines() {
        let first = parse_line(line);
        assert_eq!(first, parse_line(line.trim()), "trimming changed the parse of {line:?}");
    }
});
