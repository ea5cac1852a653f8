//! HTTP command surface.
//!
//! | Route                  | Method | Handler                    |
//! |------------------------|--------|----------------------------|
//! | `/api/health`          | GET    | [`handlers::health`]       |
//! | `/api/state`           | GET    | [`handlers::state`]        |
//! | `/api/mode`            | POST   | [`handlers::mode`]         |
//! | `/api/setpoint`        | POST   | [`handlers::setpoint`]     |
//! | `/api/angle_limit`     | POST   | [`handlers::angle_limit`]  |
//! | `/api/set_zero`        | POST   | [`handlers::set_zero`]     |
//! | `/api/set_origin`      | POST   | [`handlers::set_origin`]   |
//! | `/api/gains`           | POST   | [`handlers::gains`]        |
//! | `/api/imu/update`      | POST   | [`handlers::imu_update`]   |
//! | `/api/debug/uart`      | GET    | [`handlers::debug_uart`]   |
//!
//! Every response is JSON with an `ok` flag and a `msg`. Rejected commands
//! answer 400 with `{ok: false, error: <code>, msg}` and leave the state
//! untouched.

pub mod handlers;

use std::future::{self, Future};
use std::io;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use log::{error, info, warn};
use serde_json::json;

use crate::app::service::CommandService;
use crate::diagnostics::{LinkStats, UartLog};
use crate::error::CommandError;
use crate::state::store::StateStore;

/// Shared handles every handler reads or writes.
#[derive(Clone)]
pub struct ApiState {
    pub service: CommandService,
    pub uart_log: UartLog,
    pub stats: Arc<LinkStats>,
}

impl ApiState {
    pub fn new(store: StateStore, uart_log: UartLog, stats: Arc<LinkStats>) -> Self {
        Self {
            service: CommandService::new(store),
            uart_log,
            stats,
        }
    }
}

/// Build the router with every route bound to `state`.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/state", get(handlers::state))
        .route("/api/mode", post(handlers::mode))
        .route("/api/setpoint", post(handlers::setpoint))
        .route("/api/angle_limit", post(handlers::angle_limit))
        .route("/api/set_zero", post(handlers::set_zero))
        .route("/api/set_origin", post(handlers::set_origin))
        .route("/api/gains", post(handlers::gains))
        .route("/api/imu/update", post(handlers::imu_update))
        .route("/api/debug/uart", get(handlers::debug_uart))
        .with_state(state)
}

/// A rejected command, rendered as a 400 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError(pub CommandError);

impl From<CommandError> for ApiError {
    fn from(e: CommandError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("CMD | rejected: {}", self.0);
        let body = json!({
            "ok": false,
            "error": self.0.code(),
            "msg": self.0.to_string(),
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Resolve once `signal` fires; used as the server's graceful-shutdown
/// future.
///
/// If the signal handler cannot be installed the server keeps running
/// instead of exiting on the spot.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            error!("ctrl-c handler failed ({}), running until killed", e);
            future::pending::<()>().await;
        }
    }
}
