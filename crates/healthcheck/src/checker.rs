use std::time::Duration;

use anyhow::Result;
use thiserror::Error;

/// Why a single check attempt failed
///
/// A failure is ordinary monitoring data, recorded by the worker. It is never
/// propagated as a fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    #[error("check timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected status code {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

/// Successful check response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResponse {
    /// Status code, when the protocol has one
    pub status_code: Option<u16>,
}

/// Capability used by workers to probe a target
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Probe `target`, giving up after `timeout`
    async fn check(&self, target: &str, timeout: Duration) -> Result<CheckResponse, CheckFailure>;
}

/// HTTP/HTTPS checker
///
/// A single client is shared by every worker; the timeout is applied per
/// request so each service keeps its own bound.
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("healthcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, target: &str, timeout: Duration) -> Result<CheckResponse, CheckFailure> {
        let response = self.client.get(target).timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                CheckFailure::Timeout(timeout)
            } else {
                CheckFailure::Request(e.to_string())
            }
        })?;

        let status = response.status();

        // Only 2xx counts as healthy
        if status.is_success() {
            Ok(CheckResponse { status_code: Some(status.as_u16()) })
        } else {
            Err(CheckFailure::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `response` verbatim to every connection on a random local port
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}/health")
    }

    #[tokio::test]
    async fn test_http_check_success() {
        let target = serve("HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok").await;
        let checker = HttpChecker::new().unwrap();

        let response = checker.check(&target, Duration::from_secs(2)).await;
        assert_eq!(response, Ok(CheckResponse { status_code: Some(200) }));
    }

    #[tokio::test]
    async fn test_http_check_non_success_status() {
        let target = serve(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let checker = HttpChecker::new().unwrap();

        let response = checker.check(&target, Duration::from_secs(2)).await;
        assert_eq!(response, Err(CheckFailure::Status(503)));
    }

    #[tokio::test]
    async fn test_http_check_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let checker = HttpChecker::new().unwrap();
        let response = checker.check(&format!("http://{addr}/"), Duration::from_secs(2)).await;
        assert!(matches!(response, Err(CheckFailure::Request(_))));
    }
}
