//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! scripted adapters. No serial hardware or network socket is needed.

mod ingestor_tests;
mod mock_serial;
