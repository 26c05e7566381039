//! Progress tracking and polling for long-running ARM operations
//!
//! A mutating request that is accepted but not finished leaves a
//! [`PendingOperation`] behind. It is advanced only by polling one of:
//!
//! - the `Azure-AsyncOperation` URL, whose body reports a `status`
//! - the `Location` URL, which answers 202 until the work is done
//! - the resource itself, whose `properties.provisioningState` settles
//! - the resource itself after a bare 202 to DELETE, until it answers 404
//!
//! Polling stops on the first terminal status, on timeout, or when the
//! caller's cancellation token fires. A status check is always made before
//! the operation is declared timed out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::ResourceClient;
use crate::error::{CoreError, Result};
use crate::resource::GenericResource;

/// Progress events emitted while an operation is pending
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Operation was accepted and polling begins
    Started { operation: String },
    /// Polling iteration with current status
    Polling {
        operation: String,
        status: String,
        elapsed: Duration,
    },
    /// Operation completed successfully
    Completed { operation: String },
    /// Operation failed, timed out or was cancelled
    Failed { operation: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive a spinner.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Per-call options for long-running operations
#[derive(Clone, Default)]
pub struct LroOptions {
    /// Aborts the in-flight request and the poll loop
    pub cancel: Option<CancellationToken>,
    pub on_progress: Option<ProgressCallback>,
}

impl LroOptions {
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event);
        }
    }
}

/// Run `fut` unless the token fires first.
pub(crate) async fn cancellable<F>(cancel: Option<&CancellationToken>, fut: F) -> Result<F::Output>
where
    F: std::future::Future,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(CoreError::Cancelled),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}

/// Where the status of a pending operation is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollTarget {
    AsyncOperation(Url),
    Location(Url),
    ProvisioningState(Url),
    /// A deleted resource, gone once it answers 404
    Deletion(Url),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    InProgress,
    Succeeded,
    Failed,
}

fn classify(status: &str) -> Phase {
    match status.to_ascii_lowercase().as_str() {
        "succeeded" => Phase::Succeeded,
        "failed" | "canceled" | "cancelled" => Phase::Failed,
        _ => Phase::InProgress,
    }
}

/// Whether a provisioning state still needs polling
pub(crate) fn is_terminal_state(status: &str) -> bool {
    classify(status) != Phase::InProgress
}

/// `Retry-After` in seconds, when the service sends one
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn header_url(headers: &HeaderMap, name: &str) -> Option<Url> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Url::parse(v).ok())
}

/// Pick the poll target for an accepted response, if it is not already done.
///
/// `resource_url` is polled for provisioning state when the initial body
/// reports a non-terminal `provisioningState`.
pub(crate) fn poll_target(
    status: StatusCode,
    headers: &HeaderMap,
    body: Option<&GenericResource>,
    resource_url: Option<&Url>,
) -> Option<PollTarget> {
    if let Some(url) = header_url(headers, "azure-asyncoperation") {
        return Some(PollTarget::AsyncOperation(url));
    }
    if status == StatusCode::ACCEPTED
        && let Some(url) = header_url(headers, "location")
    {
        return Some(PollTarget::Location(url));
    }
    match (body.and_then(GenericResource::provisioning_state), resource_url) {
        (Some(state), Some(url)) if !is_terminal_state(state) => {
            Some(PollTarget::ProvisioningState(url.clone()))
        }
        _ => None,
    }
}

/// Parse a response body that may be empty or not a resource at all.
pub(crate) fn parse_resource(text: &str) -> Option<GenericResource> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::from_str(text).ok()
}

/// An accepted create/update/delete that has not finished yet
#[derive(Debug)]
pub struct PendingOperation {
    operation: String,
    target: PollTarget,
    first_delay: Option<Duration>,
}

impl PendingOperation {
    pub fn new(operation: impl Into<String>, target: PollTarget) -> Self {
        Self {
            operation: operation.into(),
            target,
            first_delay: None,
        }
    }

    /// Delay before the first status check, from the accepting response
    pub fn with_first_delay(mut self, delay: Option<Duration>) -> Self {
        self.first_delay = delay;
        self
    }

    /// Poll until the operation is terminal.
    ///
    /// Returns the resource body when the terminal response carried one.
    pub async fn wait(
        self,
        client: &ResourceClient,
        options: &LroOptions,
    ) -> Result<Option<GenericResource>> {
        let policy = client.polling();
        let timeout = policy.timeout();
        let interval = policy.interval();
        let start = Instant::now();
        let mut delay = self.first_delay.unwrap_or(interval);

        options.emit(ProgressEvent::Started {
            operation: self.operation.clone(),
        });

        let result = loop {
            // Never sleep past the deadline; the check after it still runs
            let remaining = timeout.saturating_sub(start.elapsed());
            let sleep = tokio::time::sleep(delay.min(remaining));
            if let Err(e) = cancellable(options.cancel.as_ref(), sleep).await {
                break Err(e);
            }

            let url = match &self.target {
                PollTarget::AsyncOperation(url)
                | PollTarget::Location(url)
                | PollTarget::ProvisioningState(url)
                | PollTarget::Deletion(url) => url.clone(),
            };
            let response = match client.get_url(url, options.cancel.as_ref()).await {
                Ok(response) => response,
                Err(e) => break Err(e),
            };
            let status = response.status();
            delay = retry_after(response.headers()).unwrap_or(interval);
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => break Err(e.into()),
            };

            match self.check(status, &text) {
                Ok(Some(done)) => break Ok(done),
                Ok(None) => {}
                Err(e) => break Err(e),
            }

            let reported = self.reported_status(status, &text);
            tracing::debug!(
                "{}: status '{}' after {:.1}s",
                self.operation,
                reported,
                start.elapsed().as_secs_f64()
            );
            options.emit(ProgressEvent::Polling {
                operation: self.operation.clone(),
                status: reported,
                elapsed: start.elapsed(),
            });

            if start.elapsed() >= timeout {
                break Err(CoreError::PollTimeout(timeout));
            }
        };

        match &result {
            Ok(_) => {
                tracing::info!("{} completed", self.operation);
                options.emit(ProgressEvent::Completed {
                    operation: self.operation.clone(),
                });
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", self.operation, e);
                options.emit(ProgressEvent::Failed {
                    operation: self.operation.clone(),
                    error: e.to_string(),
                });
            }
        }
        result
    }

    /// `Ok(Some(_))` when terminal success, `Ok(None)` to keep polling.
    fn check(&self, status: StatusCode, text: &str) -> Result<Option<Option<GenericResource>>> {
        match &self.target {
            PollTarget::AsyncOperation(_) => {
                if !status.is_success() {
                    return Err(remote(status, text));
                }
                let body: Value = serde_json::from_str(text)?;
                let reported = body.get("status").and_then(Value::as_str).unwrap_or("");
                match classify(reported) {
                    Phase::Succeeded => Ok(Some(None)),
                    Phase::Failed => Err(CoreError::OperationFailed {
                        status: reported.to_string(),
                        body: body
                            .get("error")
                            .map(Value::to_string)
                            .unwrap_or_else(|| text.to_string()),
                    }),
                    Phase::InProgress => Ok(None),
                }
            }
            PollTarget::Location(_) => match status {
                StatusCode::ACCEPTED => Ok(None),
                StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => {
                    Ok(Some(parse_resource(text)))
                }
                _ => Err(remote(status, text)),
            },
            PollTarget::ProvisioningState(_) => {
                if status != StatusCode::OK {
                    return Err(remote(status, text));
                }
                let resource: GenericResource = serde_json::from_str(text)?;
                let state = resource.provisioning_state().unwrap_or("Succeeded");
                match classify(state) {
                    Phase::Succeeded => Ok(Some(Some(resource))),
                    Phase::Failed => Err(CoreError::OperationFailed {
                        status: state.to_string(),
                        body: text.to_string(),
                    }),
                    Phase::InProgress => Ok(None),
                }
            }
            PollTarget::Deletion(_) => match status {
                StatusCode::NOT_FOUND => Ok(Some(None)),
                StatusCode::OK => {
                    let state = parse_resource(text)
                        .and_then(|r| r.provisioning_state().map(str::to_string));
                    match state.as_deref().map(classify) {
                        Some(Phase::Failed) => Err(CoreError::OperationFailed {
                            status: state.unwrap_or_default(),
                            body: text.to_string(),
                        }),
                        _ => Ok(None),
                    }
                }
                _ => Err(remote(status, text)),
            },
        }
    }

    fn reported_status(&self, status: StatusCode, text: &str) -> String {
        let field = match &self.target {
            PollTarget::Location(_) => return status.to_string(),
            PollTarget::Deletion(_) if status == StatusCode::NOT_FOUND => {
                return status.to_string();
            }
            PollTarget::Deletion(_) => "/properties/provisioningState",
            PollTarget::AsyncOperation(_) => "/status",
            PollTarget::ProvisioningState(_) => "/properties/provisioningState",
        };
        serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|v| v.pointer(field).and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

pub(crate) fn remote(status: StatusCode, body: &str) -> CoreError {
    CoreError::Remote {
        status: status.as_u16(),
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify("Succeeded"), Phase::Succeeded);
        assert_eq!(classify("SUCCEEDED"), Phase::Succeeded);
        assert_eq!(classify("Failed"), Phase::Failed);
        assert_eq!(classify("Canceled"), Phase::Failed);
        assert_eq!(classify("InProgress"), Phase::InProgress);
        assert_eq!(classify(""), Phase::InProgress);
    }

    #[test]
    fn test_async_operation_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "azure-asyncoperation",
            HeaderValue::from_static("https://management.azure.com/operations/1"),
        );
        headers.insert(
            "location",
            HeaderValue::from_static("https://management.azure.com/results/1"),
        );
        let target = poll_target(StatusCode::ACCEPTED, &headers, None, None);
        assert!(matches!(target, Some(PollTarget::AsyncOperation(_))));
    }

    #[test]
    fn test_location_only_on_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "location",
            HeaderValue::from_static("https://management.azure.com/results/1"),
        );
        assert!(matches!(
            poll_target(StatusCode::ACCEPTED, &headers, None, None),
            Some(PollTarget::Location(_))
        ));
        assert_eq!(poll_target(StatusCode::CREATED, &headers, None, None), None);
    }

    #[test]
    fn test_provisioning_state_target() {
        let url = Url::parse("https://management.azure.com/r?api-version=1").unwrap();
        let creating: GenericResource =
            serde_json::from_value(json!({"properties": {"provisioningState": "Creating"}}))
                .unwrap();
        let done: GenericResource =
            serde_json::from_value(json!({"properties": {"provisioningState": "Succeeded"}}))
                .unwrap();
        let headers = HeaderMap::new();

        assert_eq!(
            poll_target(StatusCode::CREATED, &headers, Some(&creating), Some(&url)),
            Some(PollTarget::ProvisioningState(url.clone()))
        );
        assert_eq!(
            poll_target(StatusCode::CREATED, &headers, Some(&done), Some(&url)),
            None
        );
        assert_eq!(
            poll_target(StatusCode::CREATED, &headers, Some(&creating), None),
            None
        );
    }

    #[test]
    fn test_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert("retry-after", HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_parse_resource_empty() {
        assert_eq!(parse_resource(""), None);
        assert_eq!(parse_resource("  "), None);
        assert!(parse_resource(r#"{"name":"s1"}"#).is_some());
    }
}
