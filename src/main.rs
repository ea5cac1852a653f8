//! TVC ground server: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                      │
//! │                                                               │
//! │  SerialConnector        LogEventSink        axum router       │
//! │  (Connector/LineSource) (EventSink)         (CommandAPI)      │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │  Ingestor (uart-ingest thread)   CommandService         │  │
//! │  │              └────────▶ StateStore ◀──────┘             │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use tvc_ground::adapters::log_sink::LogEventSink;
use tvc_ground::adapters::serial::SerialConnector;
use tvc_ground::api::{self, ApiState};
use tvc_ground::config::ServerConfig;
use tvc_ground::diagnostics::{self, LinkStats, UartLog};
use tvc_ground::state::store::StateStore;
use tvc_ground::telemetry::ingestor::{self, IngestTargets, Ingestor};

#[derive(Parser, Debug)]
#[command(name = "tvc-ground")]
#[command(about = "Ground-control server for the two-axis TVC test stand", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file; missing keys keep their defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// HTTP listen address (host:port)
    #[arg(long)]
    bind: Option<String>,

    /// Serial device of the stand controller
    #[arg(long)]
    device: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Serve the HTTP API without opening the serial link
    #[arg(long, default_value_t = false)]
    no_serial: bool,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig> {
        let mut cfg = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            cfg.bind_addr = bind;
        }
        if let Some(device) = self.device {
            cfg.serial.device = device;
        }
        if let Some(baud) = self.baud {
            cfg.serial.baud = baud;
        }
        if self.no_serial {
            cfg.serial.enabled = false;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    diagnostics::install_panic_handler();
    info!("TVC ground server v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let cfg = Cli::parse().into_config()?;

    // ── 3. Shared state ───────────────────────────────────────
    let store = StateStore::new();
    let uart_log = UartLog::new();
    let stats = Arc::new(LinkStats::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    // ── 4. Telemetry ingestor ─────────────────────────────────
    let ingest_thread = if cfg.serial.enabled {
        let targets = IngestTargets {
            store: store.clone(),
            uart_log: uart_log.clone(),
            stats: Arc::clone(&stats),
        };
        let uart_ingestor = Ingestor::new(
            SerialConnector::new(&cfg.serial),
            LogEventSink::new(),
            targets,
            cfg.serial.retry_delay(),
        );
        let handle = ingestor::spawn(uart_ingestor, Arc::clone(&shutdown))
            .context("spawning ingestor thread")?;
        Some(handle)
    } else {
        warn!("serial link disabled, IMU only updates through /api/imu/update");
        None
    };

    // ── 5. HTTP surface ───────────────────────────────────────
    let app = api::router(ApiState::new(store, uart_log, stats));
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    info!("HTTP listening on {}", cfg.bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(api::shutdown_on(tokio::signal::ctrl_c()))
        .await;

    // ── 6. Teardown ───────────────────────────────────────────
    shutdown.store(true, Ordering::Relaxed);
    if let Some(handle) = ingest_thread {
        if handle.join().is_err() {
            error!("ingestor thread exited with a panic");
        }
    }
    served.context("HTTP server failed")?;
    info!("bye");
    Ok(())
}
