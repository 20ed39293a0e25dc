//! A single request step: resolve options, perform the call, interpret the
//! response according to the step's `ResponseMode`.
//!
//! # Design
//! `interpret` is a pure function over the client's outcome so every
//! classification rule can be tested without a network. `RequestStep` only
//! glues option resolution, the client and `interpret` together.

use serde_json::Value;
use tracing::debug;

use crate::client::HttpClient;
use crate::context::{OptionsInput, StepContext};
use crate::error::{StepError, TransportError};
use crate::http::HttpResponse;

/// How a step turns a response into its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// The full response, whatever its status.
    Raw,
    /// The body as a string; non-2xx is an error.
    Text,
    /// The body parsed as JSON; non-2xx is an error.
    Json,
}

impl ResponseMode {
    /// Name the step is registered under in a chain.
    pub fn method_name(&self) -> &'static str {
        match self {
            ResponseMode::Raw => "request",
            ResponseMode::Text => "requestBody",
            ResponseMode::Json => "requestJson",
        }
    }
}

/// Successful result of a request step. The variant follows the step's mode.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Response(HttpResponse),
    Body(String),
    Json(Value),
}

impl StepOutput {
    pub fn as_response(&self) -> Option<&HttpResponse> {
        match self {
            StepOutput::Response(response) => Some(response),
            _ => None,
        }
    }

    pub fn as_body(&self) -> Option<&str> {
        match self {
            StepOutput::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            StepOutput::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into a JSON value a following step can read as its previous
    /// result. A raw response becomes `{status, headers, body}`.
    pub fn into_value(self) -> Value {
        match self {
            StepOutput::Response(response) => serde_json::json!({
                "status": response.status,
                "headers": response.headers,
                "body": response.body,
            }),
            StepOutput::Body(body) => Value::String(body),
            StepOutput::Json(value) => value,
        }
    }
}

/// Classify the client's outcome.
///
/// A transport error is returned as-is in every mode. `Raw` never looks at
/// the status code. For `Text` and `Json` a non-2xx status wins over the body.
pub fn interpret(
    mode: ResponseMode,
    outcome: Result<HttpResponse, TransportError>,
) -> Result<StepOutput, StepError> {
    let response = outcome?;

    match mode {
        ResponseMode::Raw => Ok(StepOutput::Response(response)),
        _ if !response.is_success() => Err(StepError::Status {
            status: response.status,
            body: response.body,
        }),
        ResponseMode::Text => Ok(StepOutput::Body(response.body)),
        ResponseMode::Json => match serde_json::from_str(&response.body) {
            Ok(value) => Ok(StepOutput::Json(value)),
            Err(_) => Err(StepError::Parse {
                body: response.body,
            }),
        },
    }
}

/// A step function bound to one `ResponseMode` and one client.
#[derive(Clone)]
pub struct RequestStep<C> {
    mode: ResponseMode,
    client: C,
}

impl<C: HttpClient> RequestStep<C> {
    pub fn new(mode: ResponseMode, client: C) -> Self {
        Self { mode, client }
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    pub fn name(&self) -> &'static str {
        self.mode.method_name()
    }

    /// Resolve `options` against `ctx`, perform the request and interpret the
    /// response.
    pub fn execute(
        &self,
        ctx: &dyn StepContext,
        options: impl Into<OptionsInput>,
    ) -> Result<StepOutput, StepError> {
        let request = options.into().resolve(ctx)?;
        debug!(
            step = self.name(),
            method = request.method.as_str(),
            url = %request.url,
            "issuing request"
        );
        interpret(self.mode, self.client.perform(&request))
    }

    /// Callback form of [`execute`](Self::execute); `done` runs exactly once.
    pub fn call<F>(&self, ctx: &dyn StepContext, options: impl Into<OptionsInput>, done: F)
    where
        F: FnOnce(Result<StepOutput, StepError>),
    {
        done(self.execute(ctx, options))
    }
}
