//! Transport seam between the execution engine and node channels
//!
//! The engine only ever sees `TransportError`; any of its classes triggers
//! node rotation and another attempt, never immediate termination.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::network::Node;

/// The two mutually exclusive dispatch shapes a request can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Fire-and-forget acknowledgment.
    Submit,
    /// Answer returned inline.
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("node unreachable: {0}")]
    Unreachable(String),
    #[error("deadline exceeded after {0:?}")]
    Timeout(Duration),
    #[error("node resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("node internal error: {0}")]
    Internal(String),
}

/// Dispatches encoded wire bytes to a node over its channel.
///
/// Injectable so scenario tests can script outcomes without a network.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn call(
        &self,
        node: &Node,
        kind: CallKind,
        payload: &[u8],
        deadline: Option<Duration>,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Default transport: posts wire bytes to the node address over HTTP.
#[derive(Debug, Default)]
pub struct HttpTransport;

impl HttpTransport {
    fn path(kind: CallKind) -> &'static str {
        match kind {
            CallKind::Submit => "v1/submit",
            CallKind::Query => "v1/query",
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        node: &Node,
        kind: CallKind,
        payload: &[u8],
        deadline: Option<Duration>,
    ) -> Result<Vec<u8>, TransportError> {
        let channel = node.channel()?;
        let url = format!("{}/{}", channel.base_url, Self::path(kind));

        let mut request = channel
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(payload.to_vec());
        if let Some(deadline) = deadline {
            request = request.timeout(deadline);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(deadline.unwrap_or(Duration::ZERO))
            } else if e.is_connect() {
                TransportError::Unreachable(e.to_string())
            } else {
                TransportError::Internal(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        {
            return Err(TransportError::ResourceExhausted(format!(
                "http status {status}"
            )));
        }
        if !status.is_success() {
            return Err(TransportError::Internal(format!("http status {status}")));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| TransportError::Internal(e.to_string()))
    }
}
