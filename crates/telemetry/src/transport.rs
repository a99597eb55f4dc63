//! Report transport - a single best-effort HTTP POST.
//!
//! Success means a response with status below 400. Connection failures,
//! timeouts and 4xx/5xx responses are failures. There are no retries: a failed
//! send leaves the product unmarked so a later invocation tries again.

use std::future::Future;
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Method, Response, StatusCode, Url};
use tracing::{debug, warn};

use crate::error::{Result, TelemetryError};
use crate::payload::ReportEnvelope;

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

/// Redirects followed before the response is taken as final
const MAX_REDIRECTS: usize = 1;

/// Result of one send attempt.
#[derive(Debug)]
pub enum SendOutcome {
    /// Endpoint answered with a status below 400
    Success { status: u16 },
    /// Transport error or 4xx/5xx response
    Failure(TelemetryError),
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Classify a response status code
    pub fn from_status(status: u16) -> Self {
        if status < 400 {
            Self::Success { status }
        } else {
            Self::Failure(TelemetryError::Server(status))
        }
    }
}

/// Delivers a report envelope to a collection endpoint.
pub trait Transport: Send + Sync {
    /// Post `envelope` to `endpoint` once
    fn send(
        &self,
        endpoint: &str,
        envelope: &ReportEnvelope,
    ) -> impl Future<Output = SendOutcome> + Send;
}

/// HTTP(S) transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests are bounded by `timeout`.
    ///
    /// The deadline covers connection establishment and the whole exchange of
    /// each request, so a server that accepts and never answers cannot stall the
    /// caller. Redirects are handled by [`Transport::send`], not by the client.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .redirect(Policy::none())
            .user_agent(concat!("call-home/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TelemetryError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, endpoint: &str, envelope: &ReportEnvelope) -> SendOutcome {
        let mut target = match Url::parse(endpoint) {
            Ok(url) => url,
            Err(e) => {
                return SendOutcome::Failure(TelemetryError::Network(format!(
                    "invalid endpoint '{endpoint}': {e}"
                )));
            }
        };

        let mut method = Method::POST;
        let mut hops = 0;
        loop {
            let request = if method == Method::GET {
                self.client.get(target.clone())
            } else {
                self.client.post(target.clone()).json(envelope)
            };
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(endpoint = %target, error = %e, "Failed to send telemetry report");
                    return SendOutcome::Failure(TelemetryError::Network(e.to_string()));
                }
            };

            if hops < MAX_REDIRECTS
                && response.status().is_redirection()
                && let Some(next) = redirect_target(&response, &target)
            {
                // 303 asks for the result to be fetched; other codes repeat the POST
                if response.status() == StatusCode::SEE_OTHER {
                    method = Method::GET;
                }
                debug!(from = %target, to = %next, method = %method, "Following redirect");
                target = next;
                hops += 1;
                continue;
            }

            let status = response.status().as_u16();
            let outcome = SendOutcome::from_status(status);
            if outcome.is_success() {
                debug!(endpoint = %target, status, "Telemetry report accepted");
            } else {
                warn!(endpoint = %target, status, "Telemetry report rejected");
            }
            return outcome;
        }
    }
}

/// Resolve the `Location` header of a redirect against the request URL
fn redirect_target(response: &Response, base: &Url) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    base.join(location).ok()
}
