//! Application core: command handling and the ingestion ports, zero I/O.
//!
//! Operator commands are decoded into [`commands::StandCommand`]s and run by
//! [`service::CommandService`]. The telemetry ingestor talks to the serial
//! device and the logger only through the **port traits** in [`ports`],
//! keeping both paths testable without a real stand attached.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
