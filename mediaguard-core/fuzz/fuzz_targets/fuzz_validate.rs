#![no_main]

//! Fuzz target for upload validation
//!
//! Arbitrary bytes go through the image and video validators. Validation
//! must reject garbage with an error and never panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_validate

use libfuzzer_sys::fuzz_target;
use mediaguard_core::{MediaBlob, MediaValidator};

fuzz_target!(|data: &[u8]| {
    let validator = MediaValidator::default();
    if let Ok(image) = validator.validate_image(MediaBlob::image(data.to_vec())) {
        assert!(image.image.width() > 0);
    }
    let _ = validator.validate_video(MediaBlob::video(data.to_vec()));
});
