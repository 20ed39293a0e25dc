//! HTTP client seam and its ureq-backed implementation.
//!
//! # Design
//! Steps never talk to the network directly; they hand an `HttpRequest` to an
//! `HttpClient` and get back an `HttpResponse` as data. The ureq agent is
//! configured with `http_status_as_error(false)` so 4xx/5xx responses come
//! back as `Ok`, leaving status interpretation to the step.

use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

/// Performs one HTTP round-trip.
pub trait HttpClient {
    /// Returns `Err` only when no response was received.
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).perform(request)
    }
}

/// Settings applied to every request a `UreqClient` sends.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on a whole request, connect to last body byte.
    pub timeout: Option<Duration>,
    /// Sent as `user-agent` unless the request sets its own.
    pub user_agent: Option<String>,
    /// Largest response body read, in bytes. A longer body is a transport
    /// error.
    pub body_limit: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: None,
            body_limit: u64::MAX,
        }
    }
}

/// Blocking client built on a shared ureq `Agent`.
#[derive(Clone)]
pub struct UreqClient {
    agent: Agent,
    user_agent: Option<String>,
    body_limit: u64,
}

impl UreqClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent,
            body_limit: config.body_limit,
        }
    }

    fn headers_for(&self, request: &HttpRequest) -> Vec<(String, String)> {
        let mut headers = request.headers.clone();
        if let Some(ua) = &self.user_agent {
            let overridden = headers
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case("user-agent"));
            if !overridden {
                headers.push(("user-agent".to_string(), ua.clone()));
            }
        }
        headers
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let headers = self.headers_for(request);
        let url = request.url.as_str();

        let result = match request.method {
            HttpMethod::Get => send_without_body(self.agent.get(url), request, &headers),
            HttpMethod::Delete => send_without_body(self.agent.delete(url), request, &headers),
            HttpMethod::Head => send_without_body(self.agent.head(url), request, &headers),
            HttpMethod::Post => send_with_body(self.agent.post(url), request, &headers),
            HttpMethod::Put => send_with_body(self.agent.put(url), request, &headers),
            HttpMethod::Patch => send_with_body(self.agent.patch(url), request, &headers),
        };

        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Bodies that are not valid UTF-8 are decoded lossily, not rejected.
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(|e| TransportError::new(e.to_string()))?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        debug!(method = request.method.as_str(), url, status, "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

type UreqResult = Result<ureq::http::Response<ureq::Body>, ureq::Error>;

fn decorate<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (k, v) in &request.query {
        builder = builder.query(k, v);
    }
    for (k, v) in headers {
        builder = builder.header(k.as_str(), v.as_str());
    }
    builder
}

fn send_without_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithoutBody>,
    request: &HttpRequest,
    headers: &[(String, String)],
) -> UreqResult {
    if request.body.is_some() {
        debug!(method = request.method.as_str(), "body ignored for method without payload");
    }
    decorate(builder, request, headers).call()
}

fn send_with_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    request: &HttpRequest,
    headers: &[(String, String)],
) -> UreqResult {
    let builder = decorate(builder, request, headers);
    match &request.body {
        None => builder.send_empty(),
        Some(RequestBody::Text(text)) => builder
            .content_type("text/plain; charset=utf-8")
            .send(text.as_str()),
        Some(RequestBody::Form(fields)) => {
            builder.send_form(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        }
        Some(RequestBody::Json(value)) => builder
            .content_type("application/json")
            .send(value.to_string().as_str()),
    }
}
