use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;

/// Health of a monitored service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// No check has completed yet
    #[default]
    Unknown,
    Healthy,
    /// Failing, but fewer than `max_failures` times in a row
    Degraded,
    Critical,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Unknown => write!(f, "unknown"),
            ServiceStatus::Healthy => write!(f, "healthy"),
            ServiceStatus::Degraded => write!(f, "degraded"),
            ServiceStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Read-only view of a worker's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub name: String,

    /// Checked target
    #[serde(rename = "url")]
    pub target: String,

    pub status: ServiceStatus,

    #[serde(rename = "last_check")]
    pub last_check_time: Option<DateTime<Utc>>,

    /// Absent whenever the most recent check failed
    #[serde(rename = "response_time_ms")]
    pub last_response_time_ms: Option<u64>,

    pub consecutive_failures: u32,
}

/// State owned by one worker, mutated only from its own loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerState {
    pub status: ServiceStatus,
    pub last_check_time: Option<DateTime<Utc>>,
    pub last_response_time_ms: Option<u64>,
    pub consecutive_failures: u32,
}

impl WorkerState {
    pub fn record_success(&mut self, response_time_ms: u64, at: DateTime<Utc>) {
        self.status = ServiceStatus::Healthy;
        self.consecutive_failures = 0;
        self.last_response_time_ms = Some(response_time_ms);
        self.last_check_time = Some(at);
    }

    pub fn record_failure(&mut self, max_failures: u32, at: DateTime<Utc>) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_response_time_ms = None;
        self.last_check_time = Some(at);
        self.status = if self.consecutive_failures >= max_failures {
            ServiceStatus::Critical
        } else {
            ServiceStatus::Degraded
        };
    }

    pub fn snapshot(&self, config: &ServiceConfig) -> StatusSnapshot {
        StatusSnapshot {
            name: config.name.clone(),
            target: config.target.clone(),
            status: self.status,
            last_check_time: self.last_check_time,
            last_response_time_ms: self.last_response_time_ms,
            consecutive_failures: self.consecutive_failures,
        }
    }
}
