//! Healthcheck - supervised health-check aggregation
//!
//! This library runs one concurrent worker per monitored service. Each worker
//! owns its status state machine, checks its target on a timer and reports
//! every outcome into a shared, bounded [`MetricsStore`]. The [`Aggregator`]
//! is the single entry point used by outer layers (the HTTP API).

pub mod aggregator;
pub mod checker;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod supervisor;
pub mod worker;

// Re-export main types
pub use aggregator::{Aggregator, AggregatorConfig};
pub use checker::{CheckFailure, CheckResponse, Checker, HttpChecker};
pub use config::{ServiceConfig, ServiceOptions};
pub use error::{AggregatorError, ConfigError, RegistryError};
pub use metrics::{CheckRecord, CheckResult, MetricsSnapshot, MetricsStore, ServiceMetrics, Totals};
pub use registry::Registry;
pub use supervisor::RestartPolicy;
pub use worker::{ServiceStatus, StatusSnapshot, WorkerHandle};

/// Number of check records retained per service
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
