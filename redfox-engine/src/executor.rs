//! Attempt execution
//!
//! One authentication attempt per candidate pair. The executor holds no
//! mutable state beyond a shared HTTP connection pool, so any number of
//! workers may call it concurrently against read-only [`Target`] data.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use redfox_common::{Credential, Outcome, OutcomeKind, Target};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// Phrases whose presence in a response body suggests a rejected login.
const FAILURE_INDICATORS: &[&str] = &[
    "invalid",
    "incorrect",
    "wrong",
    "failed",
    "error",
    "login failed",
    "access denied",
    "unauthorized",
];

/// Phrases whose presence suggests an authenticated page.
const SUCCESS_INDICATORS: &[&str] = &[
    "welcome",
    "dashboard",
    "home",
    "logout",
    "profile",
    "success",
    "logged in",
    "redirecting",
];

/// Issues one authentication attempt and classifies the result.
///
/// `Ok` carries a terminal outcome. `Err` means the attempt did not reach
/// a classification and the scheduler decides whether to re-queue it.
#[async_trait]
pub trait AttemptExecutor: Send + Sync {
    async fn execute(&self, target: &Target, credential: &Credential) -> EngineResult<Outcome>;
}

/// Knobs for the HTTP executor.
#[derive(Debug, Clone)]
pub struct HttpExecutorOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<String>,
    pub cookies: Option<String>,
}

impl Default for HttpExecutorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("redfox/{}", env!("CARGO_PKG_VERSION")),
            proxy: None,
            cookies: None,
        }
    }
}

/// Form-POST executor over a pooled reqwest client.
#[derive(Debug)]
pub struct HttpExecutor {
    client: Client,
    timeout: Duration,
    cookies: Option<String>,
}

impl HttpExecutor {
    pub fn new(options: HttpExecutorOptions) -> EngineResult<Self> {
        let mut builder = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(options.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none());

        if let Some(proxy_url) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| EngineError::config("proxy", e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| EngineError::config("http client", e.to_string()))?;

        Ok(Self {
            client,
            timeout: options.timeout,
            cookies: options.cookies,
        })
    }

    /// Probe the target with a GET before a session starts. Any response
    /// counts as reachable.
    pub async fn check_connectivity(&self, target: &Target) -> EngineResult<u16> {
        let response = self
            .client
            .get(&target.url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(classify_request_error)?;
        Ok(response.status().as_u16())
    }

    async fn classify(
        &self,
        response: Response,
        credential: &Credential,
        latency_ms: u64,
    ) -> EngineResult<Outcome> {
        let status = response.status();
        let status_code = status.as_u16();

        // Target-signalled throttling is not a verdict on the candidate.
        // Surface it as a recoverable error so the scheduler backs off
        // and re-attempts the same pair.
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            warn!(credential = %credential, ?retry_after_ms, "target rate limit hit");
            return Err(EngineError::RateLimited { retry_after_ms });
        }

        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            let rejected = location.contains("login")
                || location.contains("error")
                || location.contains("fail");
            let kind = if rejected {
                OutcomeKind::InvalidCredentials
            } else {
                OutcomeKind::Success
            };
            return Ok(Outcome::new(credential.clone(), kind, latency_ms)
                .with_status(status_code)
                .with_detail(format!("redirect to {location}")));
        }

        if status.is_client_error() || status.is_server_error() {
            return Ok(Outcome::new(
                credential.clone(),
                OutcomeKind::InvalidCredentials,
                latency_ms,
            )
            .with_status(status_code));
        }

        // 2xx: the page itself says whether the login took. Score the
        // body against both indicator lists.
        match response.text().await {
            Ok(body) => {
                let kind = if body_indicates_success(&body) {
                    OutcomeKind::Success
                } else {
                    OutcomeKind::InvalidCredentials
                };
                Ok(Outcome::new(credential.clone(), kind, latency_ms).with_status(status_code))
            }
            Err(e) => {
                warn!(error = %e, "failed to read response body");
                Ok(
                    Outcome::new(credential.clone(), OutcomeKind::InvalidCredentials, latency_ms)
                        .with_status(status_code)
                        .with_detail("unreadable response body"),
                )
            }
        }
    }
}

#[async_trait]
impl AttemptExecutor for HttpExecutor {
    async fn execute(&self, target: &Target, credential: &Credential) -> EngineResult<Outcome> {
        let form = [
            (target.username_field.as_str(), credential.username.as_str()),
            (target.password_field.as_str(), credential.password.as_str()),
        ];

        let mut request = self
            .client
            .post(&target.url)
            .timeout(self.timeout)
            .form(&form);
        if let Some(cookies) = &self.cookies {
            request = request.header(reqwest::header::COOKIE, cookies);
        }

        let start = Instant::now();
        match request.send().await {
            Ok(response) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                debug!(
                    credential = %credential,
                    status = response.status().as_u16(),
                    latency_ms,
                    "attempt completed"
                );
                self.classify(response, credential, latency_ms).await
            }
            Err(e) if e.is_timeout() => {
                let latency_ms = start.elapsed().as_millis() as u64;
                Ok(
                    Outcome::new(credential.clone(), OutcomeKind::Timeout, latency_ms)
                        .with_detail(format!("no response within {:?}", self.timeout)),
                )
            }
            Err(e) => Err(classify_request_error(e)),
        }
    }
}

/// Score a response body: more success phrases than failure phrases
/// means an authenticated page.
pub fn body_indicates_success(body: &str) -> bool {
    let lower = body.to_lowercase();
    let failure_points: usize = FAILURE_INDICATORS
        .iter()
        .map(|phrase| lower.matches(phrase).count())
        .sum();
    let success_points: usize = SUCCESS_INDICATORS
        .iter()
        .map(|phrase| lower.matches(phrase).count())
        .sum();
    success_points > failure_points
}

/// Map a transport failure to an engine error.
fn classify_request_error(error: reqwest::Error) -> EngineError {
    classify_transport(error.is_connect(), error.to_string())
}

/// Connection-establishment failures (refused, host unreachable, name
/// resolution) are permanent: every later candidate against the same
/// host would fail identically, so the session aborts with its partial
/// results rather than grinding through the list. Mid-stream failures
/// on an established connection stay transient.
fn classify_transport(connect_failure: bool, details: String) -> EngineError {
    if connect_failure || details.contains("dns") || details.contains("resolve") {
        EngineError::network_permanent(details)
    } else {
        EngineError::network_transient(details)
    }
}
