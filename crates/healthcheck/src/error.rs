use thiserror::Error;

/// Errors returned by the [`Registry`](crate::Registry)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("service `{0}` is already registered")]
    AlreadyRegistered(String),
    #[error("service `{0}` is not registered")]
    NotFound(String),
}

/// Errors returned when validating [`ServiceOptions`](crate::ServiceOptions)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("service name must not be empty")]
    EmptyName,
    #[error("invalid target `{target}`: {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Errors returned by the [`Aggregator`](crate::Aggregator)
///
/// These are expected, recoverable conditions. Check failures never show up
/// here: they are recorded as worker state and metrics instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregatorError {
    #[error("service `{0}` already exists")]
    AlreadyExists(String),
    #[error("service `{0}` not found")]
    NotFound(String),
    /// The worker exists but did not answer (stopped mid-request)
    #[error("service `{0}` is unavailable")]
    Unavailable(String),
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl From<RegistryError> for AggregatorError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::AlreadyRegistered(name) => Self::AlreadyExists(name),
            RegistryError::NotFound(name) => Self::NotFound(name),
        }
    }
}
