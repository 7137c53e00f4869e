use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info};

use super::state::WorkerState;
use super::{WorkerCommand, WorkerMailbox};
use crate::checker::{CheckFailure, CheckResponse, Checker};
use crate::config::ServiceConfig;
use crate::metrics::{CheckResult, MetricsStore};

/// What caused a check to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Scheduled,
    Forced,
}

/// Result of one check attempt, produced off the worker loop
#[derive(Debug)]
struct CheckOutcome {
    elapsed: Duration,
    result: Result<CheckResponse, CheckFailure>,
}

struct InFlight {
    trigger: Trigger,
    task: JoinHandle<CheckOutcome>,
}

enum Event {
    Command(Option<WorkerCommand>),
    Forced,
    CheckDone(Trigger, Result<CheckOutcome, JoinError>),
    Tick,
}

/// Health-check worker for a single service
pub struct CheckWorker {
    config: Arc<ServiceConfig>,
    checker: Arc<dyn Checker>,
    metrics: Arc<MetricsStore>,
}

impl CheckWorker {
    pub fn new(config: ServiceConfig, checker: Arc<dyn Checker>, metrics: Arc<MetricsStore>) -> Self {
        Self { config: Arc::new(config), checker, metrics }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Process the mailbox until shutdown is requested or every handle is gone
    ///
    /// State always starts fresh at `Unknown`. Network calls run on their own
    /// task so status requests are answered while a check is in flight; their
    /// outcomes are applied here, one at a time. A panicking check is resumed
    /// on this task so the supervisor sees the crash.
    ///
    /// Forced checks are only taken off the mailbox while the worker is idle.
    /// A timer tick that fires during a check is kept and runs next.
    pub async fn run(&self, mailbox: &mut WorkerMailbox) {
        let name = self.config.name.as_str();
        let mut state = WorkerState::default();
        let mut tick_pending = false;
        let mut in_flight: Option<InFlight> = None;
        let mut next_tick = Some(Instant::now() + self.config.initial_delay);

        info!(service = name, target = %self.config.target, "Worker started");

        loop {
            let idle = in_flight.is_none() && !tick_pending;
            let event = tokio::select! {
                biased;
                () = mailbox.shutdown.cancelled() => break,
                command = mailbox.commands.recv() => Event::Command(command),
                (trigger, joined) = join_in_flight(&mut in_flight) => Event::CheckDone(trigger, joined),
                () = sleep_until_deadline(next_tick) => Event::Tick,
                Some(()) = mailbox.forced.recv(), if idle => Event::Forced,
            };

            match event {
                Event::Command(Some(WorkerCommand::GetStatus(reply))) => {
                    // Requester may have given up
                    let _ = reply.send(state.snapshot(&self.config));
                }
                Event::Command(None) => break,
                Event::Forced => {
                    debug!(service = name, "Forced check started");
                    in_flight = Some(InFlight { trigger: Trigger::Forced, task: self.spawn_check() });
                }
                Event::CheckDone(trigger, joined) => {
                    in_flight = None;
                    match joined {
                        Ok(outcome) => self.apply(&mut state, outcome).await,
                        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
                        Err(error) => debug!(service = name, %error, "Check task cancelled"),
                    }
                    // Next tick is relative to completion, no catch-up
                    if trigger == Trigger::Scheduled {
                        next_tick = Some(Instant::now() + self.config.interval);
                    }
                }
                Event::Tick => {
                    next_tick = None;
                    tick_pending = true;
                }
            }

            if in_flight.is_none() && tick_pending {
                tick_pending = false;
                in_flight = Some(InFlight { trigger: Trigger::Scheduled, task: self.spawn_check() });
            }
        }

        if let Some(check) = in_flight.take() {
            check.task.abort();
        }

        info!(service = name, "Worker stopped");
    }

    fn spawn_check(&self) -> JoinHandle<CheckOutcome> {
        let checker = Arc::clone(&self.checker);
        let target = self.config.target.clone();
        let limit = self.config.timeout;

        tokio::spawn(async move {
            let started = Instant::now();
            let result = match timeout(limit, checker.check(&target, limit)).await {
                Ok(result) => result,
                Err(_) => Err(CheckFailure::Timeout(limit)),
            };
            CheckOutcome { elapsed: started.elapsed(), result }
        })
    }

    async fn apply(&self, state: &mut WorkerState, outcome: CheckOutcome) {
        let name = self.config.name.as_str();
        let previous = state.status;

        match outcome.result {
            Ok(response) => {
                let response_time_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX);
                state.record_success(response_time_ms, Utc::now());
                debug!(
                    service = name,
                    response_time_ms,
                    status_code = ?response.status_code,
                    "Check succeeded"
                );
                self.metrics.record_check(name, CheckResult::Success, Some(response_time_ms)).await;
            }
            Err(failure) => {
                state.record_failure(self.config.max_failures, Utc::now());
                debug!(
                    service = name,
                    %failure,
                    consecutive_failures = state.consecutive_failures,
                    "Check failed"
                );
                self.metrics.record_check(name, CheckResult::Failure, None).await;
            }
        }

        if state.status != previous {
            info!(service = name, from = %previous, to = %state.status, "Status changed");
        }
    }
}

async fn join_in_flight(in_flight: &mut Option<InFlight>) -> (Trigger, Result<CheckOutcome, JoinError>) {
    match in_flight {
        Some(check) => (check.trigger, (&mut check.task).await),
        None => pending().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceOptions;
    use crate::worker::{ServiceStatus, WorkerHandle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    /// Fails until `succeed_after` calls have been made
    struct CountingChecker {
        calls: AtomicUsize,
        succeed_after: usize,
    }

    #[async_trait::async_trait]
    impl Checker for CountingChecker {
        async fn check(&self, _target: &str, _timeout: Duration) -> Result<CheckResponse, CheckFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.succeed_after {
                Ok(CheckResponse { status_code: Some(200) })
            } else {
                Err(CheckFailure::Status(500))
            }
        }
    }

    fn build_worker(checker: Arc<dyn Checker>, options: ServiceOptions) -> (CheckWorker, Arc<MetricsStore>) {
        let metrics = Arc::new(MetricsStore::new());
        let config = ServiceConfig::new("svc", "http://localhost/health", options).unwrap();
        (CheckWorker::new(config, checker, metrics.clone()), metrics)
    }

    #[tokio::test]
    async fn test_scheduled_ticks_follow_interval() {
        let checker = Arc::new(CountingChecker { calls: AtomicUsize::new(0), succeed_after: 0 });
        let options = ServiceOptions::default().with_interval(Duration::from_millis(20));
        let (worker, metrics) = build_worker(checker.clone(), options);

        let (handle, mut mailbox) = WorkerHandle::channel(8, CancellationToken::new());
        let task = tokio::spawn(async move { worker.run(&mut mailbox).await });

        tokio::time::sleep(Duration::from_millis(150)).await;
        let status = handle.status().await.unwrap();
        assert_eq!(status.status, ServiceStatus::Healthy);

        let total = metrics.get_service_metrics("svc").await.totals.total;
        assert!(total >= 2, "expected several scheduled checks, got {total}");

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_exits_when_handles_dropped() {
        let checker = Arc::new(CountingChecker { calls: AtomicUsize::new(0), succeed_after: 0 });
        let options = ServiceOptions::default().with_initial_delay(Duration::from_secs(3600));
        let (worker, _metrics) = build_worker(checker, options);

        let (handle, mut mailbox) = WorkerHandle::channel(8, CancellationToken::new());
        let task = tokio::spawn(async move { worker.run(&mut mailbox).await });

        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }
}
