//! Port traits: the boundary between the ingestion logic and the outside world.
//!
//! ```text
//!   SerialConnector ──▶ Connector/LineSource ──▶ Ingestor ──▶ EventSink ──▶ LogEventSink
//! ```
//!
//! The [`Ingestor`](crate::telemetry::ingestor::Ingestor) is generic over
//! these traits, so its connection state machine runs unchanged against a
//! real UART or a scripted fake in tests.

use std::io;

use super::events::IngestEvent;

// ───────────────────────────────────────────────────────────────
// Line source (driven adapter: device → domain)
// ───────────────────────────────────────────────────────────────

/// Result of one [`LineSource::read_line`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// One line, terminator stripped, decoded lossily.
    Line(String),
    /// A line over the length limit was dropped; carries its first bytes.
    Overlong(String),
    /// No complete line yet (read timeout or partial data). The link is
    /// still up and any partial line is retained.
    Pending,
}

/// An open, line-oriented telemetry channel.
///
/// Dropping the source closes the underlying handle.
pub trait LineSource {
    /// Read the next line. Returns after a bounded amount of input, so the
    /// caller regains control even when the device never sends a usable
    /// line. `Err(_)` means the link is gone and the source must be dropped.
    fn read_line(&mut self) -> io::Result<LineRead>;
}

// ───────────────────────────────────────────────────────────────
// Connector (driven adapter: opens line sources)
// ───────────────────────────────────────────────────────────────

/// Opens a fresh [`LineSource`] each time the link (re)connects.
pub trait Connector {
    type Source: LineSource;

    fn open(&mut self) -> io::Result<Self::Source>;

    /// Human-readable link description for logs, e.g. `/dev/serial0 @ 115200`.
    fn describe(&self) -> String;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The ingestor reports link and frame events through this port.
pub trait EventSink {
    fn emit(&mut self, event: &IngestEvent);
}
