//! Serial telemetry ingestor.
//!
//! Owns the link lifecycle and turns raw lines into IMU updates:
//!
//! ```text
//!            open ok                      read line
//!   ┌──────────────┐   ─────────────▶   ┌───────────┐ ──▶ handle_line ─┐
//!   │ Disconnected │                    │ Connected │ ◀────────────────┘
//!   └──────────────┘   ◀─────────────   └───────────┘
//!     │   ▲  open err:     I/O error: close, wait retry delay
//!     └───┘  wait retry delay
//! ```
//!
//! Every non-empty line goes to the UART ring buffer before parsing.
//! Rejected lines raise one warning per error streak. A streak covers one
//! [`FrameError`] class: a different class warns again, and the next
//! accepted sample ends it. Lines cut off by the reader's length limit
//! count as [`FrameError::LineTooLong`] rejections. Serial reads happen outside the state lock;
//! only the final merge touches the [`StateStore`].

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info};

use super::frame::{Frame, parse_frame};
use crate::app::events::IngestEvent;
use crate::app::ports::{Connector, EventSink, LineRead, LineSource};
use crate::diagnostics::{LinkStats, UartLog};
use crate::error::{FrameError, IngestError};
use crate::state::store::StateStore;

/// Longest excerpt of a rejected line carried in a warning.
const REJECT_EXCERPT_BYTES: usize = 120;

/// Granularity of interruptible waits.
const PAUSE_SLICE: Duration = Duration::from_millis(50);

/// Link state of the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// What [`Ingestor::handle_line`] did with one raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line, dropped before logging.
    Empty,
    Accepted,
    Heartbeat,
    Ignored,
    Rejected(FrameError),
}

/// Tracks the current run of rejected lines of one error class.
#[derive(Debug, Default)]
struct RejectStreak {
    class: Option<FrameError>,
    suppressed: u64,
}

/// Shared handles the ingestor writes into.
#[derive(Clone)]
pub struct IngestTargets {
    pub store: StateStore,
    pub uart_log: UartLog,
    pub stats: Arc<LinkStats>,
}

pub struct Ingestor<C: Connector, E: EventSink> {
    connector: C,
    sink: E,
    targets: IngestTargets,
    retry_delay: Duration,
    link: LinkState,
    streak: RejectStreak,
}

impl<C: Connector, E: EventSink> Ingestor<C, E> {
    pub fn new(connector: C, sink: E, targets: IngestTargets, retry_delay: Duration) -> Self {
        Self {
            connector,
            sink,
            targets,
            retry_delay,
            link: LinkState::Disconnected,
            streak: RejectStreak::default(),
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    // ── Frame handling ────────────────────────────────────────

    /// Log, classify and (when valid) merge one raw line.
    pub fn handle_line(&mut self, raw: &str) -> LineOutcome {
        let line = raw.trim();
        if line.is_empty() {
            return LineOutcome::Empty;
        }
        self.targets.uart_log.push(line);
        self.targets.stats.record_line();

        match parse_frame(line) {
            Frame::Heartbeat => {
                self.targets.stats.record_heartbeat();
                LineOutcome::Heartbeat
            }
            Frame::Ignored => LineOutcome::Ignored,
            Frame::Sample(sample) => {
                self.targets.store.merge_imu(&sample.to_patch());
                self.targets.stats.record_accepted();
                if self.streak.class.is_some() {
                    let suppressed = self.streak.suppressed;
                    self.streak = RejectStreak::default();
                    self.sink.emit(&IngestEvent::StreakCleared { suppressed });
                }
                LineOutcome::Accepted
            }
            Frame::Malformed(error) => self.reject(error, line),
        }
    }

    /// Record a line the reader cut off at its length limit.
    ///
    /// `head` is the retained prefix; it goes to the ring buffer like any
    /// other line and never reaches the parser.
    pub fn handle_overlong(&mut self, head: &str) -> LineOutcome {
        self.targets.uart_log.push(head);
        self.targets.stats.record_line();
        self.reject(FrameError::LineTooLong, head)
    }

    fn reject(&mut self, error: FrameError, line: &str) -> LineOutcome {
        self.targets.stats.record_rejected();
        if self.streak.class == Some(error) {
            self.streak.suppressed += 1;
            debug!("frame rejected ({}), warning suppressed", error);
        } else {
            self.streak.class = Some(error);
            self.sink.emit(&IngestEvent::FrameRejected {
                error,
                line: excerpt(line),
            });
        }
        LineOutcome::Rejected(error)
    }

    // ── Connection lifecycle ──────────────────────────────────

    /// Run the state machine until `shutdown` is raised.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::Relaxed) {
            self.run_once(shutdown);
        }
        self.sink.emit(&IngestEvent::Stopped);
    }

    /// One Disconnected → (Connected → Disconnected) cycle.
    pub fn run_once(&mut self, shutdown: &AtomicBool) {
        let mut source = match self.connector.open() {
            Ok(source) => source,
            Err(e) => {
                let err = IngestError::SerialOpenFailure(e.kind());
                self.sink.emit(&IngestEvent::OpenFailed(err));
                self.pause(shutdown);
                return;
            }
        };

        self.set_link(LinkState::Connected);
        self.sink.emit(&IngestEvent::Connected {
            link: self.connector.describe(),
        });

        let failure = self.pump(&mut source, shutdown);
        drop(source);
        self.set_link(LinkState::Disconnected);

        if let Some(e) = failure {
            let err = IngestError::SerialReadFailure(e.kind());
            self.sink.emit(&IngestEvent::Disconnected(err));
            self.pause(shutdown);
        }
    }

    /// Read lines until the source fails (returns the error) or shutdown.
    fn pump(&mut self, source: &mut C::Source, shutdown: &AtomicBool) -> Option<io::Error> {
        while !shutdown.load(Ordering::Relaxed) {
            match source.read_line() {
                Ok(LineRead::Line(line)) => {
                    self.handle_line(&line);
                }
                Ok(LineRead::Overlong(head)) => {
                    self.handle_overlong(&head);
                }
                Ok(LineRead::Pending) => {}
                Err(e) => return Some(e),
            }
        }
        None
    }

    fn set_link(&mut self, link: LinkState) {
        self.link = link;
        self.targets.stats.set_connected(link == LinkState::Connected);
    }

    /// Sleep for the retry delay, waking early on shutdown.
    fn pause(&self, shutdown: &AtomicBool) {
        let deadline = Instant::now() + self.retry_delay;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep((deadline - now).min(PAUSE_SLICE));
        }
    }

    /// Forget per-run state after an aborted run.
    fn reset(&mut self) {
        self.set_link(LinkState::Disconnected);
        self.streak = RejectStreak::default();
    }
}

fn excerpt(line: &str) -> String {
    if line.len() <= REJECT_EXCERPT_BYTES {
        return line.to_owned();
    }
    let mut end = REJECT_EXCERPT_BYTES;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &line[..end])
}

// ── Thread spawn ─────────────────────────────────────────────

/// Spawn the ingestor on a dedicated `uart-ingest` thread.
///
/// A panic inside a run is caught and logged, and the run restarts after
/// the retry delay. The thread exits once `shutdown` is raised.
pub fn spawn<C, E>(
    mut ingestor: Ingestor<C, E>,
    shutdown: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    C: Connector + Send + 'static,
    E: EventSink + Send + 'static,
{
    thread::Builder::new()
        .name("uart-ingest".into())
        .spawn(move || supervise(&mut ingestor, &shutdown))
}

fn supervise<C: Connector, E: EventSink>(ingestor: &mut Ingestor<C, E>, shutdown: &AtomicBool) {
    info!("ingestor started (retry every {:?})", ingestor.retry_delay);
    loop {
        let run = panic::catch_unwind(AssertUnwindSafe(|| ingestor.run(shutdown)));
        if run.is_ok() {
            break;
        }
        error!("ingestor run panicked, restarting in {:?}", ingestor.retry_delay);
        ingestor.reset();
        ingestor.pause(shutdown);
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
    }
    info!("ingestor stopped");
}
