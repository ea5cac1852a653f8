//! Fuzz target: `SerialLineSource::read_line`
//!
//! Splits arbitrary byte streams into lines and checks that no returned
//! line exceeds the configured limit or still carries its terminator.
//!
//! cargo fuzz run fuzz_line_reader

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tvc_ground::adapters::serial::SerialLineSource;
use tvc_ground::app::ports::{LineRead, LineSource};

const MAX_LINE: usize = 64;

fuzz_target!(|data: &[u8]| {
    let mut source = SerialLineSource::new(Cursor::new(data.to_vec()), MAX_LINE);
    // Ends with UnexpectedEof once the cursor is drained.
    loop {
        match source.read_line() {
            Ok(LineRead::Line(line)) | Ok(LineRead::Overlong(line)) => {
                assert!(!line.ends_with('\n'));
                // Lossy decoding may widen invalid bytes to U+FFFD (3 bytes each).
                assert!(line.len() <= MAX_LINE * 3);
            }
            Ok(LineRead::Pending) => {}
            Err(_) => break,
        }
    }
});
