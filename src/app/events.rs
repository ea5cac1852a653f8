//! Outbound ingestion events.
//!
//! The [`Ingestor`](crate::telemetry::ingestor::Ingestor) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Repeated frame
//! rejections within one error streak are not emitted; the streak is
//! summarised by a single [`IngestEvent::StreakCleared`] once a good frame
//! arrives.

use crate::error::{FrameError, IngestError};

#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    /// The serial device opened.
    Connected { link: String },

    /// Opening the device failed; a retry follows after the retry delay.
    OpenFailed(IngestError),

    /// An open link failed mid-read and was closed.
    Disconnected(IngestError),

    /// First rejected line of an error streak.
    FrameRejected { error: FrameError, line: String },

    /// A valid frame ended an error streak.
    StreakCleared { suppressed: u64 },

    /// The ingestor loop exited on shutdown.
    Stopped,
}
