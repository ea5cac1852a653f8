//! Route handlers. Each one decodes its body, runs one command through
//! the [`CommandService`](crate::app::service::CommandService) and renders
//! the reply.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::{Map, Value, json};

use super::{ApiError, ApiState};
use crate::app::commands::StandCommand;
use crate::error::CommandError;
use crate::state::SystemState;

type ApiResult = Result<Json<Value>, ApiError>;

type Decoder = fn(&Map<String, Value>) -> Result<StandCommand, CommandError>;

/// Parse a request body into a JSON object. An empty body reads as `{}`.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, CommandError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(CommandError::MalformedBody),
    }
}

fn execute(api: &ApiState, cmd: StandCommand) -> ApiResult {
    let reply = api.service.execute(cmd)?;
    Ok(Json(reply.to_json()))
}

fn dispatch(api: &ApiState, body: &[u8], decode: Decoder) -> ApiResult {
    let fields = parse_body(body)?;
    execute(api, decode(&fields)?)
}

pub async fn health(State(api): State<ApiState>) -> Json<Value> {
    let link = if api.stats.snapshot().connected {
        "serial link up"
    } else {
        "serial link down"
    };
    Json(json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "msg": format!("tvc ground server running, {link}"),
    }))
}

pub async fn state(State(api): State<ApiState>) -> Json<SystemState> {
    Json(api.service.snapshot())
}

pub async fn mode(State(api): State<ApiState>, body: Bytes) -> ApiResult {
    dispatch(&api, &body, StandCommand::mode)
}

pub async fn setpoint(State(api): State<ApiState>, body: Bytes) -> ApiResult {
    dispatch(&api, &body, StandCommand::setpoint)
}

pub async fn angle_limit(State(api): State<ApiState>, body: Bytes) -> ApiResult {
    dispatch(&api, &body, StandCommand::angle_limit)
}

pub async fn set_zero(State(api): State<ApiState>) -> ApiResult {
    execute(&api, StandCommand::ResetZero)
}

pub async fn set_origin(State(api): State<ApiState>) -> ApiResult {
    execute(&api, StandCommand::ResetOrigin)
}

pub async fn gains(State(api): State<ApiState>, body: Bytes) -> ApiResult {
    dispatch(&api, &body, StandCommand::gains)
}

pub async fn imu_update(State(api): State<ApiState>, body: Bytes) -> ApiResult {
    dispatch(&api, &body, StandCommand::imu_update)
}

pub async fn debug_uart(State(api): State<ApiState>) -> Json<Value> {
    let lines = api.uart_log.lines();
    Json(json!({
        "ok": true,
        "count": lines.len(),
        "lines": lines,
        "link": api.stats.snapshot(),
    }))
}
