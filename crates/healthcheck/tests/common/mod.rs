//! Shared test doubles for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use healthcheck::{CheckFailure, CheckResponse, Checker, ServiceOptions};

pub const TARGET: &str = "http://127.0.0.1:9/health";

/// Options for tests that drive checks with `force_check` only
pub fn manual_options() -> ServiceOptions {
    ServiceOptions::default()
        .with_interval(Duration::from_secs(3600))
        .with_initial_delay(Duration::from_secs(3600))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Replays a fixed script of outcomes, then keeps succeeding
pub struct ScriptedChecker {
    script: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
}

impl ScriptedChecker {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self { script: Mutex::new(script.into_iter().collect()), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Checker for ScriptedChecker {
    async fn check(&self, _target: &str, _timeout: Duration) -> Result<CheckResponse, CheckFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let healthy = self.script.lock().unwrap().pop_front().unwrap_or(true);
        if healthy {
            Ok(CheckResponse { status_code: Some(200) })
        } else {
            Err(CheckFailure::Status(500))
        }
    }
}

/// Never answers
pub struct HangingChecker;

#[async_trait::async_trait]
impl Checker for HangingChecker {
    async fn check(&self, _target: &str, _timeout: Duration) -> Result<CheckResponse, CheckFailure> {
        std::future::pending().await
    }
}

/// Answers after a fixed delay
pub struct SlowChecker(pub Duration);

#[async_trait::async_trait]
impl Checker for SlowChecker {
    async fn check(&self, _target: &str, _timeout: Duration) -> Result<CheckResponse, CheckFailure> {
        tokio::time::sleep(self.0).await;
        Ok(CheckResponse { status_code: Some(200) })
    }
}

/// Panics on the first `panics` calls, then succeeds
pub struct PanickingChecker {
    panics: usize,
    calls: AtomicUsize,
}

impl PanickingChecker {
    pub fn new(panics: usize) -> Self {
        Self { panics, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Checker for PanickingChecker {
    async fn check(&self, _target: &str, _timeout: Duration) -> Result<CheckResponse, CheckFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.panics {
            panic!("checker bug on call {call}");
        }
        Ok(CheckResponse { status_code: Some(200) })
    }
}

/// Fails `failures` times, panics once, then succeeds
pub struct FailThenPanicChecker {
    failures: usize,
    calls: AtomicUsize,
}

impl FailThenPanicChecker {
    pub fn new(failures: usize) -> Self {
        Self { failures, calls: AtomicUsize::new(0) }
    }
}

#[async_trait::async_trait]
impl Checker for FailThenPanicChecker {
    async fn check(&self, _target: &str, _timeout: Duration) -> Result<CheckResponse, CheckFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(CheckFailure::Status(500));
        }
        if call == self.failures {
            panic!("checker bug after {call} failures");
        }
        Ok(CheckResponse { status_code: Some(200) })
    }
}

/// Poll `condition` until it yields a value or two seconds elapse
pub async fn eventually<T, F, Fut>(mut condition: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(value) = condition().await {
            return value;
        }
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
