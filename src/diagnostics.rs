//! Link diagnostics.
//!
//! Keeps the last [`UART_LOG_CAPACITY`] raw serial lines in a ring buffer
//! (oldest evicted first) so an operator can see exactly what the stand
//! controller is sending, whether or not it parsed. The ring has its own
//! lock, separate from the stand state, because it has one producer (the
//! ingestor) and one consumer (`GET /api/debug/uart`).
//!
//! [`LinkStats`] adds lock-free counters for the same endpoint.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use heapless::HistoryBuffer;
use serde::Serialize;

/// Default number of raw lines retained.
pub const UART_LOG_CAPACITY: usize = 100;

/// Longest line stored, in bytes. Longer lines are cut at a char boundary.
pub const UART_LINE_MAX_BYTES: usize = 512;

/// Bounded, thread-safe log of raw serial lines.
#[derive(Clone)]
pub struct UartLog<const N: usize = UART_LOG_CAPACITY> {
    ring: Arc<Mutex<HistoryBuffer<String, N>>>,
}

impl<const N: usize> UartLog<N> {
    pub fn new() -> Self {
        Self {
            ring: Arc::new(Mutex::new(HistoryBuffer::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryBuffer<String, N>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line, evicting the oldest once full.
    pub fn push(&self, line: &str) {
        let stored = truncate_utf8(line, UART_LINE_MAX_BYTES).to_owned();
        self.lock().write(stored);
    }

    /// All retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lock().oldest_ordered().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl<const N: usize> Default for UartLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ───────────────────────────────────────────────────────────────
// Link counters
// ───────────────────────────────────────────────────────────────

/// Ingestion counters, updated by the ingestor thread without locking.
#[derive(Debug, Default)]
pub struct LinkStats {
    connected: AtomicBool,
    connects: AtomicU64,
    lines: AtomicU64,
    frames_accepted: AtomicU64,
    frames_rejected: AtomicU64,
    heartbeats: AtomicU64,
}

/// Point-in-time copy of [`LinkStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LinkStatsSnapshot {
    pub connected: bool,
    pub connects: u64,
    pub lines: u64,
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    pub heartbeats: u64,
}

impl LinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, up: bool) {
        self.connected.store(up, Ordering::Relaxed);
        if up {
            self.connects.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_line(&self) {
        self.lines.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.frames_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_heartbeat(&self) {
        self.heartbeats.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LinkStatsSnapshot {
        LinkStatsSnapshot {
            connected: self.connected.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            lines: self.lines.load(Ordering::Relaxed),
            frames_accepted: self.frames_accepted.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            heartbeats: self.heartbeats.load(Ordering::Relaxed),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Route panic messages through the logger before the default handling.
///
/// Call once at startup, after the logger is initialised.
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        match info.location() {
            Some(loc) => log::error!(
                "PANIC in '{}' at {}:{}: {}",
                name,
                loc.file(),
                loc.line(),
                reason
            ),
            None => log::error!("PANIC in '{}': {}", name, reason),
        }
        default_hook(info);
    }));
}
