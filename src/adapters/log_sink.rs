//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing ingestion events to the `log`
//! facade (stderr via `env_logger` in the server binary).

use log::{info, warn};

use crate::app::events::IngestEvent;
use crate::app::ports::EventSink;
use crate::error::IngestError;

/// Adapter that logs every [`IngestEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &IngestEvent) {
        match event {
            IngestEvent::Connected { link } => {
                info!("LINK | connected to {}", link);
            }
            IngestEvent::OpenFailed(e) => {
                warn!("LINK | {}, retrying", e);
            }
            IngestEvent::Disconnected(e) => {
                warn!("LINK | {}, connection closed", e);
            }
            IngestEvent::FrameRejected { error, line } => {
                warn!(
                    "FRAME | {}: {} (repeats of this kind muted until a valid frame)",
                    IngestError::from(*error),
                    line
                );
            }
            IngestEvent::StreakCleared { suppressed } => {
                info!("FRAME | valid telemetry resumed, {} rejected line(s) muted", suppressed);
            }
            IngestEvent::Stopped => {
                info!("LINK | ingestor stopped");
            }
        }
    }
}
