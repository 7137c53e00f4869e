//! Shared `tracing` setup for the healthcheck binaries.

mod subscriber;

pub use subscriber::{LogFormat, init_tracing, init_tracing_with_level};
