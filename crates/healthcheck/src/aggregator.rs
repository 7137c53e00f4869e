//! Public facade over workers, registry and metrics.
//!
//! The aggregator owns the lifecycle of every worker: it validates service
//! configuration, starts supervised workers, stops them, and answers status
//! queries by addressing workers through the registry.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::checker::Checker;
use crate::config::{ServiceConfig, ServiceOptions};
use crate::error::AggregatorError;
use crate::metrics::MetricsStore;
use crate::registry::Registry;
use crate::supervisor::{self, RestartPolicy};
use crate::worker::{CheckWorker, StatusSnapshot, WorkerHandle};

/// Tunables of an [`Aggregator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// How crashed workers are restarted
    pub restart_policy: RestartPolicy,

    /// Status requests, and separately forced checks, that may queue up for
    /// a single worker before callers wait. Treated as at least 1.
    pub mailbox_capacity: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { restart_policy: RestartPolicy::default(), mailbox_capacity: 32 }
    }
}

/// Entry point for managing and querying monitored services
pub struct Aggregator {
    registry: Arc<Registry>,
    metrics: Arc<MetricsStore>,
    checker: Arc<dyn Checker>,
    config: AggregatorConfig,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl Aggregator {
    pub fn new(checker: Arc<dyn Checker>, metrics: Arc<MetricsStore>) -> Self {
        Self::with_config(checker, metrics, AggregatorConfig::default())
    }

    pub fn with_config(
        checker: Arc<dyn Checker>,
        metrics: Arc<MetricsStore>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            metrics,
            checker,
            config,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Metrics store shared by every worker
    pub fn metrics(&self) -> &Arc<MetricsStore> {
        &self.metrics
    }

    /// Start monitoring `target` under `name`
    ///
    /// Nothing is started when the name is already taken.
    pub async fn add_service(
        &self,
        name: &str,
        target: &str,
        options: ServiceOptions,
    ) -> Result<(), AggregatorError> {
        let config = ServiceConfig::new(name, target, options)?;

        if self.shutdown.is_cancelled() {
            return Err(AggregatorError::Unavailable(config.name));
        }

        let (handle, mailbox) =
            WorkerHandle::channel(self.config.mailbox_capacity.max(1), self.shutdown.child_token());

        // Registration is the atomic check-and-claim of the name; the worker
        // is only spawned once it succeeded.
        self.registry.register(&config.name, handle.clone()).await?;

        // A shutdown that raced the registration may have swept already
        if self.shutdown.is_cancelled() {
            self.registry.unregister_if(&config.name, |current| current.same_worker(&handle)).await;
            return Err(AggregatorError::Unavailable(config.name));
        }

        info!(
            service = %config.name,
            target = %config.target,
            interval = ?config.interval,
            timeout = ?config.timeout,
            max_failures = config.max_failures,
            "Adding service"
        );

        let worker = CheckWorker::new(config, Arc::clone(&self.checker), Arc::clone(&self.metrics));
        supervisor::spawn(
            &self.tracker,
            worker,
            mailbox,
            handle,
            Arc::clone(&self.registry),
            self.config.restart_policy,
        );

        Ok(())
    }

    /// Stop monitoring `name`
    ///
    /// Waits until the worker has stopped. Recorded metrics are kept.
    pub async fn remove_service(&self, name: &str) -> Result<(), AggregatorError> {
        let handle = self.registry.unregister(name).await?;

        handle.shutdown();
        handle.stopped().await;

        info!(service = name, "Removed service");
        Ok(())
    }

    pub async fn get_status(&self, name: &str) -> Result<StatusSnapshot, AggregatorError> {
        let handle = self.registry.lookup(name).await?;
        handle.status().await.ok_or_else(|| AggregatorError::Unavailable(name.to_string()))
    }

    /// Status of every registered service
    ///
    /// Workers are queried concurrently. A worker that stops while being
    /// queried is left out.
    pub async fn get_all_statuses(&self) -> HashMap<String, StatusSnapshot> {
        let entries = self.registry.entries().await;

        let replies = join_all(entries.into_iter().map(|(name, handle)| async move {
            let status = handle.status().await;
            (name, status)
        }))
        .await;

        replies
            .into_iter()
            .filter_map(|(name, status)| match status {
                Some(status) => Some((name, status)),
                None => {
                    warn!(service = %name, "Worker did not answer status request");
                    None
                }
            })
            .collect()
    }

    pub async fn list_services(&self) -> Vec<String> {
        self.registry.list_names().await
    }

    /// Queue an immediate, additional check for `name`
    pub async fn force_check(&self, name: &str) -> Result<(), AggregatorError> {
        let handle = self.registry.lookup(name).await?;
        if handle.force_check().await {
            Ok(())
        } else {
            Err(AggregatorError::Unavailable(name.to_string()))
        }
    }

    /// Stop every worker and wait for them to finish
    ///
    /// Services added afterwards are rejected as unavailable.
    pub async fn shutdown(&self) {
        info!("Shutting down health-check workers");

        // Cancel before sweeping so a concurrent add either sees the
        // cancellation or is swept
        self.shutdown.cancel();
        for (name, handle) in self.registry.entries().await {
            self.registry.unregister_if(&name, |current| current.same_worker(&handle)).await;
        }

        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
