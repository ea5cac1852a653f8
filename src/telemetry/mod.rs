//! Telemetry ingestion from the stand controller.
//!
//! ```text
//! ┌────────────┐   lines   ┌──────────┐  Frame   ┌──────────┐  ImuPatch  ┌────────────┐
//! │ LineSource │ ────────▶ │ Ingestor │ ───────▶ │  parser  │ ─────────▶ │ StateStore │
//! └────────────┘           └──────────┘          └──────────┘            └────────────┘
//!                               │ raw line
//!                               ▼
//!                          ┌──────────┐
//!                          │ UartLog  │
//!                          └──────────┘
//! ```

pub mod frame;
pub mod ingestor;
