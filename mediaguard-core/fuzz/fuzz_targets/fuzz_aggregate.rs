#![no_main]

//! Fuzz target for frame score aggregation
//!
//! Interprets the input as little-endian f64 scores and keeps those in
//! [0, 1], as the scorer does. The aggregate must stay within that range
//! and never exceed the largest score.
//!
//! Run with: cargo +nightly fuzz run fuzz_aggregate

use libfuzzer_sys::fuzz_target;
use mediaguard_core::aggregate;

fuzz_target!(|data: &[u8]| {
    let scores: Vec<f64> = data
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
        .filter(|v| (0.0..=1.0).contains(v))
        .collect();

    if let Ok(result) = aggregate(&scores) {
        let max = scores.iter().copied().fold(0.0, f64::max);
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(result.confidence <= max + 1e-4);
    }
});
