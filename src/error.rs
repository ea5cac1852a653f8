//! Unified error types for the ground-control server.
//!
//! A single `Error` enum that every subsystem converts into. Command-path
//! variants are surfaced to HTTP callers; ingestion-path variants are
//! recovered inside the telemetry loop and only ever reach the log.
//! All variants are `Copy` so they can be carried through events and
//! responses without allocation.

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the server funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An inbound operator command was rejected.
    Command(CommandError),
    /// The serial telemetry link failed.
    Ingest(IngestError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Ingest(e) => write!(f, "ingest: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Rejections on the command path. None of these mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Mode token is not one of the three known modes.
    InvalidMode,
    /// Axis scope string is not a recognised axis key.
    InvalidAxis,
    /// Numeric field is missing, non-numeric or not finite.
    InvalidNumber(&'static str),
    /// A gains update carried none of kp/ki/kd.
    NoGainsProvided,
    /// An IMU vector field was present but not an object.
    InvalidImuShape(&'static str),
    /// Request body is not a JSON object.
    MalformedBody,
}

impl CommandError {
    /// Stable machine-readable code used in failure responses.
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidMode => "invalid_mode",
            Self::InvalidAxis => "invalid_axis",
            Self::InvalidNumber(_) => "invalid_number",
            Self::NoGainsProvided => "no_gains_provided",
            Self::InvalidImuShape(_) => "invalid_imu_shape",
            Self::MalformedBody => "malformed_body",
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMode => write!(f, "invalid mode (expected manuel, auto_tvc or demo)"),
            Self::InvalidAxis => write!(f, "invalid axis (expected x or y)"),
            Self::InvalidNumber(field) => write!(f, "invalid number for '{field}'"),
            Self::NoGainsProvided => write!(f, "no gains provided (expected kp, ki and/or kd)"),
            Self::InvalidImuShape(field) => write!(f, "'{field}' must be an object"),
            Self::MalformedBody => write!(f, "request body must be a JSON object"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Ingestion errors
// ---------------------------------------------------------------------------

/// Failures on the telemetry path. Always recovered locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestError {
    /// The serial device could not be opened.
    SerialOpenFailure(io::ErrorKind),
    /// A read on an open serial device failed.
    SerialReadFailure(io::ErrorKind),
    /// A line was read but could not be turned into a telemetry sample.
    FrameParseFailure(FrameError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerialOpenFailure(kind) => write!(f, "serial open failed ({kind})"),
            Self::SerialReadFailure(kind) => write!(f, "serial read failed ({kind})"),
            Self::FrameParseFailure(e) => write!(f, "frame rejected: {e}"),
        }
    }
}

impl From<IngestError> for Error {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

// ---------------------------------------------------------------------------
// Frame errors
// ---------------------------------------------------------------------------

/// Why a telemetry line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Line is not shaped like a JSON object (`{ ... }`).
    NotJsonObject,
    /// Line looked like an object but is not valid JSON.
    InvalidJson,
    /// Valid object, but neither a complete accel nor gyro vector.
    NoMotionData,
    /// The controller reported an error or warning notice instead of a sample.
    DeviceReported,
    /// Line ran past the reader's length limit and was cut off.
    LineTooLong,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJsonObject => write!(f, "not a JSON object"),
            Self::InvalidJson => write!(f, "malformed JSON"),
            Self::NoMotionData => write!(f, "no complete accel or gyro vector"),
            Self::DeviceReported => write!(f, "device notice"),
            Self::LineTooLong => write!(f, "line exceeds length limit"),
        }
    }
}

impl From<FrameError> for IngestError {
    fn from(e: FrameError) -> Self {
        Self::FrameParseFailure(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
