//! TVC ground-control library.
//!
//! Exposes the state store, telemetry ingestion and HTTP surface so the
//! server binary, the integration tests and the fuzz targets share one
//! implementation.

#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod state;
pub mod telemetry;
