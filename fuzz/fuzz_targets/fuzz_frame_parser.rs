//! Fuzz target: `parse_frame`
//!
//! Drives arbitrary bytes, decoded the way the serial reader decodes
//! them, into the telemetry frame parser. Every input must classify
//! without panicking, and an accepted sample must carry motion data.
//!
//! cargo fuzz run fuzz_frame_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use tvc_ground::telemetry::frame::{Frame, parse_frame};

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    if let Frame::Sample(sample) = parse_frame(&line) {
        assert!(
            sample.accel_g.is_some() || sample.gyro_dps.is_some(),
            "sample accepted without accel or gyro"
        );
        let patch = sample.to_patch();
        assert!(!patch.is_empty());
        assert!(patch.angle_deg.is_none());
    }
});
