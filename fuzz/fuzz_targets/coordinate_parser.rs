#![no_main]

use libfuzzer_sys::fuzz_target;
use regex_harness::resolver::{compare_versions, Coordinate};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing must never panic, and a parsed coordinate must re-parse to itself
        if let Ok(coordinate) = Coordinate::parse(input) {
            let again = Coordinate::parse(&coordinate.to_string());
            assert!(again.is_ok());
        }
        // Version ordering must be reflexive for any input
        assert_eq!(compare_versions(input, input), std::cmp::Ordering::Equal);
    }
});
