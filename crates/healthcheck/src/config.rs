//! Service configuration.
//!
//! [`ServiceOptions`] carries the tunables a caller may override when adding
//! a service. Validating them together with a name and a target produces the
//! immutable [`ServiceConfig`] a worker is started with.

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Default time between two scheduled checks
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default upper bound on a single check attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of consecutive failures before a service turns critical
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Overridable options for a monitored service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Time between the end of one scheduled check and the start of the next
    pub interval: Duration,

    /// Hard upper bound on a single check attempt
    pub timeout: Duration,

    /// Consecutive failures after which the service is critical
    pub max_failures: u32,

    /// Delay before the first scheduled check
    pub initial_delay: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            max_failures: DEFAULT_MAX_FAILURES,
            initial_delay: Duration::ZERO,
        }
    }
}

impl ServiceOptions {
    /// Set the check interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the check timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the failure threshold
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Set the delay before the first scheduled check
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::Zero("interval"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Zero("timeout"));
        }
        if self.max_failures == 0 {
            return Err(ConfigError::Zero("max_failures"));
        }
        Ok(())
    }
}

/// Immutable configuration of one monitored service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: String,
    pub target: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub max_failures: u32,
    pub initial_delay: Duration,
}

impl ServiceConfig {
    /// Validate `options` for the given service and freeze them
    pub fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        options: ServiceOptions,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let target = target.into();

        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        validate_target(&target)?;
        options.validate()?;

        Ok(Self {
            name,
            target,
            interval: options.interval,
            timeout: options.timeout,
            max_failures: options.max_failures,
            initial_delay: options.initial_delay,
        })
    }
}

/// Only absolute http(s) URLs can be checked
fn validate_target(target: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidTarget { target: target.to_string(), reason };

    let url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme `{other}`"))),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(())
}
