//! HTTP request and response described as plain data.
//!
//! # Design
//! `HttpRequest` is the options value a request step hands to its
//! `HttpClient`. It serializes to and from JSON so a previous chain step can
//! produce it as an ordinary value. A bare URL string is shorthand for a GET.
//!
//! All fields use owned types so values can be threaded between steps
//! without lifetime concerns.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::StepError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

/// Payload sent with a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestBody {
    /// Sent verbatim as `text/plain`.
    Text(String),
    /// Sent as `application/x-www-form-urlencoded`.
    #[serde(deserialize_with = "pairs")]
    Form(Vec<(String, String)>),
    /// Serialized and sent as `application/json`.
    Json(Value),
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    #[serde(default)]
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, deserialize_with = "pairs")]
    pub headers: Vec<(String, String)>,
    #[serde(default, deserialize_with = "pairs")]
    pub query: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<RequestBody>,
}

/// Name/value pairs written either as `[["k", "v"], ...]` or as an object
/// `{"k": "v"}`. Object values that are not strings keep their JSON text,
/// so `{"id": 7}` becomes `("id", "7")`. Objects come out sorted by key.
fn pairs<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pairs {
        List(Vec<(String, String)>),
        Map(serde_json::Map<String, Value>),
    }

    Ok(match Pairs::deserialize(deserializer)? {
        Pairs::List(list) => list,
        Pairs::Map(map) => map
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect(),
    })
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Replace the body with url-encoded form fields.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.body = Some(RequestBody::Form(fields));
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }
}

impl From<&str> for HttpRequest {
    fn from(url: &str) -> Self {
        HttpRequest::get(url)
    }
}

impl From<String> for HttpRequest {
    fn from(url: String) -> Self {
        HttpRequest::get(url)
    }
}

/// Convert a previous step's result into request options.
///
/// A string is taken as the URL of a GET; an object must deserialize as an
/// `HttpRequest`.
impl TryFrom<&Value> for HttpRequest {
    type Error = StepError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(url) => Ok(HttpRequest::get(url.as_str())),
            Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| StepError::InvalidOptions(e.to_string())),
            other => Err(StepError::InvalidOptions(format!(
                "expected a URL string or an options object, got {other}"
            ))),
        }
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by an `HttpClient` after executing an `HttpRequest`, whatever
/// the status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
