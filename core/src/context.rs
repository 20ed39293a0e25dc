//! Execution context offered by the host pipeline, and how a step's options
//! are resolved against it.

use serde_json::Value;

use crate::error::StepError;
use crate::http::HttpRequest;

/// What a request step can see of the chain it runs in.
pub trait StepContext {
    /// Result produced by the step that ran immediately before this one.
    fn previous_result(&self) -> Option<&Value>;

    /// The previous result when it is a JSON string, e.g. a URL.
    fn previous_str(&self) -> Option<&str> {
        self.previous_result().and_then(Value::as_str)
    }
}

/// Context holding nothing but the previous step's result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousResult(pub Option<Value>);

impl PreviousResult {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Some(value.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl StepContext for PreviousResult {
    fn previous_result(&self) -> Option<&Value> {
        self.0.as_ref()
    }
}

/// The options argument a step is invoked with.
pub enum OptionsInput {
    /// Use these options unchanged.
    Literal(HttpRequest),
    /// Build the options from the context at invocation time.
    Derived(Box<dyn FnOnce(&dyn StepContext) -> HttpRequest>),
    /// Take the options from the previous step's result.
    Absent,
}

impl OptionsInput {
    pub fn derived<F>(f: F) -> Self
    where
        F: FnOnce(&dyn StepContext) -> HttpRequest + 'static,
    {
        OptionsInput::Derived(Box::new(f))
    }

    pub fn resolve(self, ctx: &dyn StepContext) -> Result<HttpRequest, StepError> {
        match self {
            OptionsInput::Literal(request) => Ok(request),
            OptionsInput::Derived(f) => Ok(f(ctx)),
            OptionsInput::Absent => {
                let previous = ctx.previous_result().ok_or_else(|| {
                    StepError::InvalidOptions("no previous result to take options from".to_string())
                })?;
                HttpRequest::try_from(previous)
            }
        }
    }
}

impl From<HttpRequest> for OptionsInput {
    fn from(request: HttpRequest) -> Self {
        OptionsInput::Literal(request)
    }
}

impl From<&str> for OptionsInput {
    fn from(url: &str) -> Self {
        OptionsInput::Literal(url.into())
    }
}

impl From<String> for OptionsInput {
    fn from(url: String) -> Self {
        OptionsInput::Literal(url.into())
    }
}

impl From<Option<HttpRequest>> for OptionsInput {
    fn from(request: Option<HttpRequest>) -> Self {
        request.map_or(OptionsInput::Absent, OptionsInput::Literal)
    }
}

impl std::fmt::Debug for OptionsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionsInput::Literal(request) => f.debug_tuple("Literal").field(request).finish(),
            OptionsInput::Derived(_) => f.write_str("Derived(..)"),
            OptionsInput::Absent => f.write_str("Absent"),
        }
    }
}
