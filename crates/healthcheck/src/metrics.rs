//! In-memory metrics store.
//!
//! Keeps, for every service name that ever reported a check:
//! - the most recent check records, newest first, bounded by the store
//!   capacity (oldest evicted)
//! - lifetime totals that are never truncated
//!
//! Entries are created on the first recorded check and are kept for the
//! lifetime of the store, independently of the worker that produced them.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::trace;

use crate::DEFAULT_HISTORY_CAPACITY;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckResult {
    Success,
    Failure,
}

/// One recorded check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub result: CheckResult,

    /// Response time, present only for successful checks
    pub response_time_ms: Option<u64>,

    pub timestamp: DateTime<Utc>,
}

/// Lifetime counters of a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total: u64,
    pub failures: u64,
}

/// History and totals of one service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetrics {
    /// Most recent records, newest first
    pub checks: Vec<CheckRecord>,
    pub totals: Totals,
}

/// Point-in-time copy of the whole store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub checks: HashMap<String, Vec<CheckRecord>>,
    pub totals: HashMap<String, Totals>,
}

#[derive(Debug, Default)]
struct Entry {
    checks: VecDeque<CheckRecord>,
    totals: Totals,
}

#[derive(Debug)]
struct Inner {
    capacity: usize,
    services: HashMap<String, Entry>,
}

/// Bounded per-service history of check outcomes
///
/// All mutation for every service goes through one lock, so an append,
/// its eviction and the totals increment are observed together.
#[derive(Debug)]
pub struct MetricsStore {
    inner: RwLock<Inner>,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsStore {
    /// Create a store keeping the default number of records per service
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a store keeping at most `capacity` records per service
    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: RwLock::new(Inner { capacity, services: HashMap::new() }) }
    }

    /// Record one check outcome for `service`
    ///
    /// `response_time_ms` is dropped for failures.
    pub async fn record_check(&self, service: &str, result: CheckResult, response_time_ms: Option<u64>) {
        let record = CheckRecord {
            result,
            response_time_ms: match result {
                CheckResult::Success => response_time_ms,
                CheckResult::Failure => None,
            },
            timestamp: Utc::now(),
        };

        let mut inner = self.inner.write().await;
        let capacity = inner.capacity;
        let entry = inner.services.entry(service.to_string()).or_default();

        entry.checks.push_front(record);
        entry.checks.truncate(capacity);

        entry.totals.total += 1;
        if result == CheckResult::Failure {
            entry.totals.failures += 1;
        }

        trace!(service, ?result, total = entry.totals.total, "Recorded check");
    }

    /// Snapshot of every service, taken under a single lock acquisition
    pub async fn get_metrics(&self) -> MetricsSnapshot {
        let inner = self.inner.read().await;

        let mut snapshot = MetricsSnapshot::default();
        for (name, entry) in &inner.services {
            snapshot.checks.insert(name.clone(), entry.checks.iter().cloned().collect());
            snapshot.totals.insert(name.clone(), entry.totals);
        }
        snapshot
    }

    /// History and totals of one service
    ///
    /// Unknown services yield empty history and zero totals rather than an
    /// error.
    pub async fn get_service_metrics(&self, service: &str) -> ServiceMetrics {
        let inner = self.inner.read().await;

        inner
            .services
            .get(service)
            .map(|entry| ServiceMetrics {
                checks: entry.checks.iter().cloned().collect(),
                totals: entry.totals,
            })
            .unwrap_or_default()
    }
}
