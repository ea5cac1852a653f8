//! Integration tests for the serial ingestor: frame handling, the
//! connection state machine and the supervised thread.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tvc_ground::app::events::IngestEvent;
use tvc_ground::app::ports::Connector;
use tvc_ground::diagnostics::{LinkStats, UART_LOG_CAPACITY, UartLog};
use tvc_ground::error::{FrameError, IngestError};
use tvc_ground::state::store::StateStore;
use tvc_ground::state::{ImuState, Vec3};
use tvc_ground::telemetry::ingestor::{self, IngestTargets, Ingestor, LinkState};

use crate::mock_serial::{RecordingSink, ScriptedConnector, Session, Step};

fn targets() -> IngestTargets {
    IngestTargets {
        store: StateStore::new(),
        uart_log: UartLog::new(),
        stats: Arc::new(LinkStats::new()),
    }
}

fn make_ingestor<C: Connector>(
    connector: C,
    targets: &IngestTargets,
) -> Ingestor<C, RecordingSink> {
    Ingestor::new(connector, RecordingSink::new(), targets.clone(), Duration::ZERO)
}

/// Feed `lines` through one connected session and run to completion.
fn run_lines(lines: &[&str]) -> (IngestTargets, Vec<IngestEvent>) {
    let t = targets();
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut ing = make_ingestor(ScriptedConnector::lines(lines, Arc::clone(&shutdown)), &t);
    ing.run(&shutdown);
    let events = ing.sink().events.clone();
    (t, events)
}

fn is_rejection(e: &IngestEvent) -> bool {
    matches!(e, IngestEvent::FrameRejected { .. })
}

// ── Frame handling ────────────────────────────────────────────

#[test]
fn full_frame_updates_every_imu_field() {
    let (t, _) = run_lines(&[
        r#"{"accel":{"x":1,"y":2,"z":3},"gyro":{"x":0,"y":0,"z":0},"temp":21.5,"t_ms":1000}"#,
    ]);
    let imu = t.store.imu();
    assert_eq!(
        imu.accel_g,
        Vec3 {
            x: 1.0,
            y: 2.0,
            z: 3.0
        }
    );
    assert_eq!(imu.gyro_dps, Vec3::default());
    assert_eq!(imu.temp_c, 21.5);
    assert_eq!(imu.t_ms, 1000.0);
}

#[test]
fn alternate_key_spellings_are_accepted() {
    let (t, _) = run_lines(&[
        r#"{"accel_g":{"x":0.1,"y":0.2,"z":0.9},"gyro_dps":{"x":4,"y":5,"z":6},"temp_c":30}"#,
    ]);
    let imu = t.store.imu();
    assert_eq!(
        imu.accel_g,
        Vec3 {
            x: 0.1,
            y: 0.2,
            z: 0.9
        }
    );
    assert_eq!(
        imu.gyro_dps,
        Vec3 {
            x: 4.0,
            y: 5.0,
            z: 6.0
        }
    );
    assert_eq!(imu.temp_c, 30.0);
}

#[test]
fn incomplete_accel_vector_leaves_imu_unchanged() {
    let (t, events) = run_lines(&[r#"{"accel":{"x":1,"y":2}}"#]);
    assert_eq!(t.store.imu(), ImuState::default());
    assert!(events.contains(&IngestEvent::FrameRejected {
        error: FrameError::NoMotionData,
        line: r#"{"accel":{"x":1,"y":2}}"#.into(),
    }));
    assert_eq!(t.stats.snapshot().frames_rejected, 1);
}

#[test]
fn heartbeat_changes_nothing_and_logs_no_warning() {
    let (t, events) = run_lines(&[r#"{"status":"ok"}"#]);
    assert_eq!(t.store.snapshot(), StateStore::new().snapshot());
    assert!(!events.iter().any(is_rejection));
    assert_eq!(t.uart_log.lines(), vec![r#"{"status":"ok"}"#.to_owned()]);
    assert_eq!(t.stats.snapshot().heartbeats, 1);
}

#[test]
fn device_notice_is_rejected_as_notice() {
    let (_, events) = run_lines(&[r#"{"error":"mpu_init_failed"}"#]);
    assert!(matches!(
        events.iter().find(|e| is_rejection(e)),
        Some(IngestEvent::FrameRejected {
            error: FrameError::DeviceReported,
            ..
        })
    ));
}

#[test]
fn warnings_are_suppressed_within_a_streak() {
    let (_, events) = run_lines(&[
        "boot banner",
        "not json either",
        r#"{"t_ms":5}"#,
        r#"{"gyro":{"x":1,"y":1,"z":1}}"#,
        "garbage again",
    ]);
    // banner warns, second junk line is muted, the motionless object is a new class
    assert_eq!(events.iter().filter(|e| is_rejection(e)).count(), 3);
    assert!(events.contains(&IngestEvent::StreakCleared { suppressed: 1 }));
}

#[test]
fn overlong_lines_are_rejected_once_per_streak() {
    let t = targets();
    let shutdown = Arc::new(AtomicBool::new(false));
    let head = "x".repeat(32);
    let mut steps: Vec<Step> = (0..50).map(|_| Step::Overlong(head.clone())).collect();
    steps.push(Step::line(r#"{"gyro":{"x":1,"y":1,"z":1}}"#));
    let connector = ScriptedConnector::new(vec![Session::Steps(steps)], Arc::clone(&shutdown));
    let mut ing = make_ingestor(connector, &t);
    ing.run(&shutdown);

    let events = &ing.sink().events;
    assert_eq!(events.iter().filter(|e| is_rejection(e)).count(), 1);
    assert!(events.contains(&IngestEvent::FrameRejected {
        error: FrameError::LineTooLong,
        line: head.clone(),
    }));
    assert!(events.contains(&IngestEvent::StreakCleared { suppressed: 49 }));

    let stats = t.stats.snapshot();
    assert_eq!(stats.frames_rejected, 50);
    assert_eq!(stats.frames_accepted, 1);
    assert_eq!(t.uart_log.lines().first(), Some(&head));
}

#[test]
fn every_non_empty_line_reaches_the_ring_in_order() {
    let (t, _) = run_lines(&["first", "", "   ", r#"{"status":"ok"}"#, "last"]);
    assert_eq!(
        t.uart_log.lines(),
        vec!["first".to_owned(), r#"{"status":"ok"}"#.to_owned(), "last".to_owned()]
    );
}

#[test]
fn ring_buffer_stays_bounded() {
    let lines: Vec<String> = (0..UART_LOG_CAPACITY + 50).map(|i| format!("junk {i}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (t, events) = run_lines(&refs);

    let kept = t.uart_log.lines();
    assert_eq!(kept.len(), UART_LOG_CAPACITY);
    assert_eq!(kept.first().map(String::as_str), Some("junk 50"));
    assert_eq!(kept.last(), lines.last());
    assert_eq!(events.iter().filter(|e| is_rejection(e)).count(), 1);
}

// ── Connection lifecycle ──────────────────────────────────────

#[test]
fn recovers_from_open_and_read_failures() {
    let t = targets();
    let shutdown = Arc::new(AtomicBool::new(false));
    let connector = ScriptedConnector::new(
        vec![
            Session::OpenFails(io::ErrorKind::NotFound),
            Session::Steps(vec![
                Step::line(r#"{"gyro":{"x":1,"y":2,"z":3}}"#),
                Step::Fail(io::ErrorKind::BrokenPipe),
            ]),
            Session::Steps(vec![Step::line(r#"{"gyro":{"x":7,"y":8,"z":9}}"#)]),
        ],
        Arc::clone(&shutdown),
    );
    let opens = Arc::clone(&connector.opens);
    let mut ing = make_ingestor(connector, &t);
    ing.run(&shutdown);

    assert_eq!(opens.load(Ordering::SeqCst), 3);
    assert_eq!(
        ing.sink().events,
        vec![
            IngestEvent::OpenFailed(IngestError::SerialOpenFailure(io::ErrorKind::NotFound)),
            IngestEvent::Connected {
                link: "scripted".into()
            },
            IngestEvent::Disconnected(IngestError::SerialReadFailure(io::ErrorKind::BrokenPipe)),
            IngestEvent::Connected {
                link: "scripted".into()
            },
            IngestEvent::Stopped,
        ]
    );
    assert_eq!(
        t.store.imu().gyro_dps,
        Vec3 {
            x: 7.0,
            y: 8.0,
            z: 9.0
        }
    );
    assert_eq!(ing.link_state(), LinkState::Disconnected);

    let stats = t.stats.snapshot();
    assert_eq!(stats.connects, 2);
    assert!(!stats.connected);
    assert_eq!(stats.frames_accepted, 2);
}

#[test]
fn read_timeouts_keep_the_link_up() {
    let t = targets();
    let shutdown = Arc::new(AtomicBool::new(false));
    let connector = ScriptedConnector::new(
        vec![Session::Steps(vec![
            Step::Timeout,
            Step::Timeout,
            Step::line(r#"{"accel":{"x":0,"y":0,"z":1}}"#),
            Step::Timeout,
        ])],
        Arc::clone(&shutdown),
    );
    let opens = Arc::clone(&connector.opens);
    let mut ing = make_ingestor(connector, &t);
    ing.run(&shutdown);

    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert!(
        !ing.sink()
            .events
            .iter()
            .any(|e| matches!(e, IngestEvent::Disconnected(_)))
    );
    assert_eq!(t.store.imu().accel_g.z, 1.0);
}

// ── Supervised thread ─────────────────────────────────────────

/// Panics on the first open, then delegates.
struct PanicsOnce {
    inner: ScriptedConnector,
    armed: bool,
}

impl Connector for PanicsOnce {
    type Source = <ScriptedConnector as Connector>::Source;

    fn open(&mut self) -> io::Result<Self::Source> {
        if self.armed {
            self.armed = false;
            panic!("scripted connector fault");
        }
        self.inner.open()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

#[test]
fn spawned_thread_runs_until_shutdown() {
    let t = targets();
    let shutdown = Arc::new(AtomicBool::new(false));
    let connector = ScriptedConnector::lines(
        &[r#"{"gyro":{"x":1,"y":1,"z":1},"t_ms":42}"#],
        Arc::clone(&shutdown),
    );
    let handle = ingestor::spawn(make_ingestor(connector, &t), Arc::clone(&shutdown)).unwrap();
    handle.join().unwrap();

    assert!(shutdown.load(Ordering::SeqCst));
    assert_eq!(t.store.imu().t_ms, 42.0);
}

#[test]
fn spawned_thread_survives_a_panicking_run() {
    let t = targets();
    let shutdown = Arc::new(AtomicBool::new(false));
    let connector = PanicsOnce {
        inner: ScriptedConnector::lines(
            &[r#"{"temp":1,"gyro":{"x":2,"y":2,"z":2}}"#],
            Arc::clone(&shutdown),
        ),
        armed: true,
    };
    let handle = ingestor::spawn(make_ingestor(connector, &t), Arc::clone(&shutdown)).unwrap();
    handle.join().expect("panic must be contained in the ingestor thread");

    assert_eq!(t.store.imu().temp_c, 1.0);
}
