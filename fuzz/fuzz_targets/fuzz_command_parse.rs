//! Fuzz target: command verb parsing
//!
//! Arbitrary bytes go through `Command::parse`; a parse may only
//! succeed when the trimmed input is exactly one of the four verbs.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use irrinet::wire::Command;

fuzz_target!(|data: &[u8]| {
    if let Some(cmd) = Command::parse(data) {
        let text = core::str::from_utf8(data).unwrap_or_else(|_| {
            panic!("a parsed command implies valid UTF-8 input")
        });
        assert_eq!(text.trim(), cmd.as_str());
    }
});
