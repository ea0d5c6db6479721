//! Fanuc Dashboard - chart-ready telemetry API for Fanuc CNC machines
//!
//! This library exposes the core modules for testing and reuse.

pub mod charts;
pub mod common;
pub mod config;
pub mod error;
pub mod fanuc;
pub mod routes;
pub mod store;
pub mod sync;
pub mod timeline;
