//! Fuzz target: reading log-line parser
//!
//! Feeds arbitrary text to `SensorReading::from_str` and verifies:
//! - No panics under arbitrary input
//! - Anything that parses renders back to a line that parses to the
//!   same reading
//!
//! cargo fuzz run fuzz_reading_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use envnode::sensors::SensorReading;

// Linked for the embassy critical-section implementation.
use critical_section as _;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(reading) = text.parse::<SensorReading>() {
        let line = reading.to_string();
        assert_eq!(line.parse::<SensorReading>(), Ok(reading));
    }
});
