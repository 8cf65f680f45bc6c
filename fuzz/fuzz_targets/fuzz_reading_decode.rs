//! Fuzz target: wire payload decoding
//!
//! Feeds arbitrary bytes through the lenient reading and alert decoders
//! and checks that decoding never panics and that any accepted reading
//! survives a re-encode.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A decoded reading always carries a non-empty sensor id
//! - encode(decode(bytes)) decodes again to the same value
//!
//! cargo fuzz run fuzz_reading_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use irrinet::wire::{AlertMessage, SensorReading};

fuzz_target!(|data: &[u8]| {
    if let Ok(reading) = SensorReading::decode(data) {
        assert!(!reading.sensor_id.is_empty());

        let reencoded = reading.encode();
        let again = SensorReading::decode(&reencoded)
            .unwrap_or_else(|_| panic!("re-encoded reading must decode"));
        assert_eq!(again, reading);
    }

    // The alert decoder shares the lenient path; it must also hold up.
    let _ = AlertMessage::decode(data);
});
