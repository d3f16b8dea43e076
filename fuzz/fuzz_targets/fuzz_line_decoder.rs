//! Fuzz target: `LineDecoder::push`
//!
//! Drives arbitrary byte sequences into the sensor line decoder and
//! asserts that it never panics and never hands out a line longer than
//! its buffer.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use soberguard::link::codec::{Decoded, LineDecoder, MAX_LINE_LEN};
use soberguard::sensors::SensorEvent;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    for &byte in data {
        if let Some(Decoded::Line(line)) = decoder.push(byte) {
            assert!(!line.is_empty(), "decoder must not yield empty lines");
            assert!(line.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
            assert_ne!(SensorEvent::classify(line), SensorEvent::None);
        }
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    for &byte in data {
        let _ = decoder.push(byte);
    }
});
