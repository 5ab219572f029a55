//! Webhook transport shared by every flow.
//!
//! Each flow builds one JSON body, issues one POST and waits at most the
//! flow's bound. The bound wraps the whole request future (send + body read)
//! in [`tokio::time::timeout`]; when it fires the future is dropped, which
//! aborts the in-flight request.
//!
//! Outcomes are classified into exactly one of: a decoded reply,
//! [`EduGuideError::HttpStatus`], [`EduGuideError::Timeout`],
//! [`EduGuideError::Connection`] or [`EduGuideError::MalformedResponse`].
//! The "explicit success flag" check belongs to each flow, which knows the
//! shape of its reply. Nothing is retried here.

use crate::error::EduGuideError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The four external endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Chat,
    Counselling,
    Solutions,
    Analysis,
}

impl Flow {
    pub const ALL: [Flow; 4] = [Flow::Chat, Flow::Counselling, Flow::Solutions, Flow::Analysis];

    /// Default wait bound in seconds.
    pub fn default_timeout_secs(self) -> u64 {
        match self {
            Flow::Chat => 30,
            Flow::Counselling => 90,
            Flow::Solutions | Flow::Analysis => 120,
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flow::Chat => "Chat",
            Flow::Counselling => "Counselling",
            Flow::Solutions => "Solutions",
            Flow::Analysis => "Analysis",
        })
    }
}

/// Thin JSON-over-HTTP client around a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing connection pool.
    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// POST `body` as JSON to `url` and decode the reply as `R`.
    ///
    /// # Errors
    /// - [`EduGuideError::Timeout`] when `timeout` elapses first
    /// - [`EduGuideError::Connection`] when the request never got a response
    /// - [`EduGuideError::HttpStatus`] on a non-2xx status; a `message` field
    ///   in a JSON error body is kept
    /// - [`EduGuideError::MalformedResponse`] when a 2xx body is not `R`
    pub async fn post_json<B, R>(
        &self,
        flow: Flow,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<R, EduGuideError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        info!("{flow}: POST {url} (bound {}s)", timeout.as_secs());
        let started = Instant::now();

        let request = async {
            let response = self
                .http
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| EduGuideError::Connection {
                    flow,
                    detail: e.to_string(),
                })?;

            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| EduGuideError::Connection {
                    flow,
                    detail: e.to_string(),
                })?;
            Ok::<_, EduGuideError>((status, bytes))
        };

        let (status, bytes) = match tokio::time::timeout(timeout, request).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("{flow}: no reply within {}s, request aborted", timeout.as_secs());
                return Err(EduGuideError::Timeout {
                    flow,
                    secs: timeout.as_secs(),
                });
            }
        };

        debug!(
            "{flow}: HTTP {} with {} bytes in {}ms",
            status.as_u16(),
            bytes.len(),
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            let message = error_message(&bytes);
            warn!("{flow}: HTTP {} ({:?})", status.as_u16(), message);
            return Err(EduGuideError::HttpStatus {
                flow,
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("{flow}: could not decode reply: {e}");
            EduGuideError::MalformedResponse {
                flow,
                detail: e.to_string(),
            }
        })
    }
}

/// Pull a `message` string out of a JSON error body, if there is one.
fn error_message(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_bounds() {
        assert_eq!(Flow::Chat.default_timeout_secs(), 30);
        assert_eq!(Flow::Counselling.default_timeout_secs(), 90);
        assert_eq!(Flow::Analysis.default_timeout_secs(), 120);
        assert_eq!(Flow::Solutions.to_string(), "Solutions");
    }

    #[test]
    fn error_message_reads_json_message() {
        assert_eq!(
            error_message(br#"{"message":"Image unreadable"}"#).as_deref(),
            Some("Image unreadable")
        );
        assert_eq!(error_message(br#"{"message":"  "}"#), None);
        assert_eq!(error_message(b"<html>Bad Gateway</html>"), None);
        assert_eq!(error_message(br#"{"error":"x"}"#), None);
    }
}
