//! Stub HTTP server for exercising request steps over real sockets.
//!
//! # Design
//! Every request goes to a single fallback handler that looks for the first
//! pending `Stub` matching method, path and whichever of query, headers and
//! body the stub constrains. A
//! matched stub is consumed, so each one answers exactly once; anything
//! unmatched gets `501` naming the request.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, error, warn};

/// Constraint on the request body.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyMatch {
    /// Url-encoded fields, in any order.
    Form(Vec<(String, String)>),
    /// Exact text.
    Text(String),
    /// JSON equal to this value, whatever the formatting.
    Json(serde_json::Value),
}

impl BodyMatch {
    fn matches(&self, body: &str) -> bool {
        match self {
            BodyMatch::Form(expected) => same_pairs(expected, body),
            BodyMatch::Text(expected) => expected == body,
            BodyMatch::Json(expected) => serde_json::from_str::<serde_json::Value>(body)
                .map(|value| &value == expected)
                .unwrap_or(false),
        }
    }
}

fn same_pairs(expected: &[(String, String)], encoded: &str) -> bool {
    serde_urlencoded::from_str::<Vec<(String, String)>>(encoded)
        .map(|mut fields| {
            let mut expected = expected.to_vec();
            fields.sort();
            expected.sort();
            fields == expected
        })
        .unwrap_or(false)
}

fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// One canned reply.
#[derive(Clone, Debug)]
pub struct Stub {
    pub method: Method,
    pub path: String,
    pub query: Option<Vec<(String, String)>>,
    pub headers: Vec<(String, String)>,
    pub body: Option<BodyMatch>,
    pub status: u16,
    pub content_type: String,
    pub reply_body: String,
}

impl Stub {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: None,
            headers: Vec::new(),
            body: None,
            status: 200,
            content_type: "text/plain; charset=utf-8".to_string(),
            reply_body: String::new(),
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn head(path: &str) -> Self {
        Self::new(Method::HEAD, path)
    }

    /// Only match requests whose url-encoded body holds exactly these fields.
    pub fn with_form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = Some(BodyMatch::Form(owned_pairs(fields)));
        self
    }

    pub fn with_text(mut self, body: &str) -> Self {
        self.body = Some(BodyMatch::Text(body.to_string()));
        self
    }

    pub fn with_json(mut self, body: &serde_json::Value) -> Self {
        self.body = Some(BodyMatch::Json(body.clone()));
        self
    }

    /// Only match requests whose query string holds exactly these pairs.
    pub fn with_query(mut self, pairs: &[(&str, &str)]) -> Self {
        self.query = Some(owned_pairs(pairs));
        self
    }

    /// Only match requests carrying this header value. Repeatable.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn reply(mut self, status: u16, body: &str) -> Self {
        self.status = status;
        self.reply_body = body.to_string();
        self
    }

    pub fn reply_json(mut self, status: u16, body: &serde_json::Value) -> Self {
        self.status = status;
        self.content_type = "application/json".to_string();
        self.reply_body = body.to_string();
        self
    }

    fn matches(&self, method: &Method, uri: &Uri, headers: &HeaderMap, body: &str) -> bool {
        if &self.method != method || self.path != uri.path() {
            return false;
        }
        if let Some(expected) = &self.query {
            if !same_pairs(expected, uri.query().unwrap_or_default()) {
                return false;
            }
        }
        let headers_match = self.headers.iter().all(|(name, value)| {
            headers
                .get_all(name.as_str())
                .iter()
                .any(|v| v.to_str().map(|v| v == value).unwrap_or(false))
        });
        headers_match && self.body.as_ref().map_or(true, |m| m.matches(body))
    }

    fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

pub type Stubs = Arc<RwLock<Vec<Stub>>>;

pub fn app(stubs: Vec<Stub>) -> Router {
    router(Arc::new(RwLock::new(stubs)))
}

fn router(stubs: Stubs) -> Router {
    Router::new().fallback(dispatch).with_state(stubs)
}

pub async fn run(listener: TcpListener, stubs: Stubs) -> Result<(), std::io::Error> {
    axum::serve(listener, router(stubs)).await
}

async fn dispatch(
    State(stubs): State<Stubs>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut stubs = stubs.write().await;
    let found = stubs
        .iter()
        .position(|stub| stub.matches(&method, &uri, &headers, &body));

    match found {
        Some(index) => {
            let stub = stubs.remove(index);
            debug!(stub = %stub.describe(), status = stub.status, "stub matched");
            let status = StatusCode::from_u16(stub.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, [(header::CONTENT_TYPE, stub.content_type)], stub.reply_body).into_response()
        }
        None => {
            warn!(%method, path = uri.path(), "no stub matched");
            (
                StatusCode::NOT_IMPLEMENTED,
                format!("no stub for {method} {}", uri.path()),
            )
                .into_response()
        }
    }
}

/// A server running on its own thread, bound to a random local port.
pub struct MockServer {
    addr: SocketAddr,
    stubs: Stubs,
}

impl MockServer {
    pub fn start(stubs: Vec<Stub>) -> Result<Self, std::io::Error> {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = std_listener.local_addr()?;
        std_listener.set_nonblocking(true)?;

        let stubs: Stubs = Arc::new(RwLock::new(stubs));
        let served = Arc::clone(&stubs);

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("failed to build runtime: {e}");
                    return;
                }
            };
            let result = rt.block_on(async {
                let listener = TcpListener::from_std(std_listener)?;
                run(listener, served).await
            });
            if let Err(e) = result {
                error!("mock server stopped: {e}");
            }
        });

        Ok(Self { addr, stubs })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    /// Stubs that have not been hit yet, as `"METHOD /path"`.
    ///
    /// Must not be called from inside an async runtime.
    pub fn pending(&self) -> Vec<String> {
        self.stubs.blocking_read().iter().map(Stub::describe).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    fn no_headers() -> HeaderMap {
        HeaderMap::new()
    }

    #[test]
    fn stub_defaults_to_empty_200() {
        let stub = Stub::get("/user-one");
        assert_eq!(stub.status, 200);
        assert!(stub.reply_body.is_empty());
        assert_eq!(stub.describe(), "GET /user-one");
    }

    #[test]
    fn stub_matches_method_and_path() {
        let stub = Stub::get("/user-one");
        assert!(stub.matches(&Method::GET, &uri("/user-one"), &no_headers(), ""));
        assert!(!stub.matches(&Method::POST, &uri("/user-one"), &no_headers(), ""));
        assert!(!stub.matches(&Method::GET, &uri("/user-two"), &no_headers(), ""));
    }

    #[test]
    fn form_match_ignores_field_order() {
        let stub = Stub::post("/user-two").with_form(&[("token", "foo"), ("id", "7")]);
        let u = uri("/user-two");
        assert!(stub.matches(&Method::POST, &u, &no_headers(), "id=7&token=foo"));
        assert!(!stub.matches(&Method::POST, &u, &no_headers(), "token=bar&id=7"));
        assert!(!stub.matches(&Method::POST, &u, &no_headers(), "token=foo"));
    }

    #[test]
    fn query_match_requires_every_pair() {
        let stub = Stub::get("/search").with_query(&[("q", "fred"), ("page", "2")]);
        let headers = no_headers();
        assert!(stub.matches(&Method::GET, &uri("/search?page=2&q=fred"), &headers, ""));
        assert!(!stub.matches(&Method::GET, &uri("/search?q=fred"), &headers, ""));
        assert!(!stub.matches(&Method::GET, &uri("/search"), &headers, ""));
    }

    #[test]
    fn header_match_ignores_name_case() {
        let stub = Stub::get("/user-one").with_header("X-Trace", "abc");
        let mut headers = HeaderMap::new();
        headers.insert("x-trace", "abc".parse().unwrap());
        assert!(stub.matches(&Method::GET, &uri("/user-one"), &headers, ""));
        headers.insert("x-trace", "other".parse().unwrap());
        assert!(!stub.matches(&Method::GET, &uri("/user-one"), &headers, ""));
    }

    #[test]
    fn json_match_ignores_formatting() {
        let stub = Stub::put("/user-one").with_json(&serde_json::json!({ "a": 1, "b": [true] }));
        let u = uri("/user-one");
        assert!(stub.matches(&Method::PUT, &u, &no_headers(), r#"{ "b": [true], "a": 1 }"#));
        assert!(!stub.matches(&Method::PUT, &u, &no_headers(), r#"{"a":2,"b":[true]}"#));
        assert!(!stub.matches(&Method::PUT, &u, &no_headers(), "a=1"));
    }

    #[test]
    fn reply_json_sets_content_type() {
        let stub = Stub::get("/user-one").reply_json(200, &serde_json::json!({ "name": "fred" }));
        assert_eq!(stub.content_type, "application/json");
        assert_eq!(stub.reply_body, r#"{"name":"fred"}"#);
    }
}
