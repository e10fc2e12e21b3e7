//! Blocking HTTP transport.
//!
//! # Design
//! `HttpClient` owns one ureq `Agent`, so connections are pooled across every
//! request sent through the same client. `send` never fails: transport
//! problems are captured in the returned `RequestResult` together with the
//! elapsed time. Non-2xx statuses are ordinary responses.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

use crate::error::Error;
use crate::http::{HeaderSet, HttpMethod, HttpRequest, HttpResponse};

/// Default request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deadline for one request, from dispatch until the body is read.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Outcome of sending one request.
///
/// Exactly one of `response` and `error` is present. `elapsed` covers the
/// whole exchange whether or not it succeeded.
#[derive(Debug, Clone)]
pub struct RequestResult {
    elapsed: Duration,
    response: Option<HttpResponse>,
    error: Option<Error>,
}

impl RequestResult {
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Transport error, if the request never produced a response.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }

    pub fn is_success(&self) -> bool {
        self.response.as_ref().is_some_and(HttpResponse::is_success)
    }
}

/// Synchronous HTTP client with a fixed per-request timeout.
#[derive(Clone)]
pub struct HttpClient {
    agent: Agent,
    config: ClientConfig,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `req` and wait for the full response.
    pub fn send(&self, req: &HttpRequest) -> RequestResult {
        let start = Instant::now();
        let outcome = self.dispatch(req);
        let elapsed = start.elapsed();

        match outcome {
            Ok(response) => {
                debug!(method = %req.method, url = %req.url, status = response.status, ?elapsed, "request completed");
                RequestResult {
                    elapsed,
                    response: Some(response),
                    error: None,
                }
            }
            Err(err) => {
                warn!(method = %req.method, url = %req.url, error = %err, ?elapsed, "request failed");
                RequestResult {
                    elapsed,
                    response: None,
                    error: Some(Error::Transport(err.to_string())),
                }
            }
        }
    }

    fn dispatch(&self, req: &HttpRequest) -> Result<HttpResponse, ureq::Error> {
        let mut response = match req.method {
            HttpMethod::Get => with_headers(self.agent.get(&req.url), &req.headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(&req.url), &req.headers).call(),
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(&req.url), &req.headers);
                match req.body.as_deref() {
                    Some(body) => builder.send(body),
                    None => builder.send_empty(),
                }
            }
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        // ureq caps bodies at 10 MB by default; a large body is still a response.
        let body = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &HeaderSet) -> RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}
