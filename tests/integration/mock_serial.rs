//! Scripted serial transport for integration tests.
//!
//! A [`ScriptedConnector`] replays a list of [`Session`]s, one per open
//! attempt. When the last session runs dry the shared shutdown flag is
//! raised so `Ingestor::run` returns on its own.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tvc_ground::app::events::IngestEvent;
use tvc_ground::app::ports::{Connector, EventSink, LineRead, LineSource};

// ── Script ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Step {
    Line(String),
    /// A line the reader cut off; carries the retained head.
    Overlong(String),
    Timeout,
    Fail(io::ErrorKind),
}

#[allow(dead_code)]
impl Step {
    pub fn line(s: &str) -> Self {
        Self::Line(s.to_owned())
    }
}

#[derive(Debug, Clone)]
pub enum Session {
    /// The open attempt itself fails.
    OpenFails(io::ErrorKind),
    /// The open succeeds and the source replays these steps.
    Steps(Vec<Step>),
}

// ── Connector ─────────────────────────────────────────────────

pub struct ScriptedConnector {
    sessions: VecDeque<Session>,
    shutdown: Arc<AtomicBool>,
    pub opens: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl ScriptedConnector {
    pub fn new(sessions: Vec<Session>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            sessions: sessions.into(),
            shutdown,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Single session that yields `lines` and then stops the ingestor.
    pub fn lines(lines: &[&str], shutdown: Arc<AtomicBool>) -> Self {
        let steps = lines.iter().map(|l| Step::line(l)).collect();
        Self::new(vec![Session::Steps(steps)], shutdown)
    }
}

impl Connector for ScriptedConnector {
    type Source = ScriptedSource;

    fn open(&mut self) -> io::Result<ScriptedSource> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.sessions.pop_front() {
            None => {
                self.shutdown.store(true, Ordering::SeqCst);
                Err(io::ErrorKind::NotFound.into())
            }
            Some(Session::OpenFails(kind)) => {
                if self.sessions.is_empty() {
                    self.shutdown.store(true, Ordering::SeqCst);
                }
                Err(kind.into())
            }
            Some(Session::Steps(steps)) => Ok(ScriptedSource {
                steps: steps.into(),
                last: self.sessions.is_empty(),
                shutdown: Arc::clone(&self.shutdown),
            }),
        }
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

// ── Source ────────────────────────────────────────────────────

pub struct ScriptedSource {
    steps: VecDeque<Step>,
    last: bool,
    shutdown: Arc<AtomicBool>,
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self) -> io::Result<LineRead> {
        match self.steps.pop_front() {
            Some(Step::Line(line)) => Ok(LineRead::Line(line)),
            Some(Step::Overlong(head)) => Ok(LineRead::Overlong(head)),
            Some(Step::Timeout) => Ok(LineRead::Pending),
            Some(Step::Fail(kind)) => Err(kind.into()),
            None if self.last => {
                self.shutdown.store(true, Ordering::SeqCst);
                Ok(LineRead::Pending)
            }
            None => Err(io::ErrorKind::UnexpectedEof.into()),
        }
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<IngestEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&IngestEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &IngestEvent) {
        self.events.push(event.clone());
    }
}
