use std::io::Error as IoError;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use healthcheck::AggregatorError;
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;

/// Startup failures of the server binary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to build HTTP checker: {0:#}")]
    Checker(#[source] anyhow::Error),
    #[error("Failed to add service: {0}")]
    Service(#[from] AggregatorError),
}

/// Aggregator errors as HTTP responses
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AggregatorError);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AggregatorError::NotFound(_) => StatusCode::NOT_FOUND,
            AggregatorError::AlreadyExists(_) => StatusCode::CONFLICT,
            AggregatorError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AggregatorError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match &self.0 {
            AggregatorError::NotFound(service) => {
                json!({ "error": "Service not found", "service": service })
            }
            AggregatorError::AlreadyExists(service) => {
                json!({ "error": "Service already exists", "service": service })
            }
            AggregatorError::Unavailable(service) => {
                json!({ "error": "Service unavailable", "service": service })
            }
            AggregatorError::InvalidConfig(error) => json!({ "error": error.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
