//! HTTP request steps for a sequential step chain.
//!
//! # Overview
//! `RequestMethods` bundles three steps, `request`, `requestBody` and
//! `requestJson`, that a chain registers by name. Each resolves its
//! `HttpRequest` from an explicit value, a closure over the `StepContext`, or
//! the previous step's result, performs the call through an `HttpClient`, and
//! interprets the response according to its `ResponseMode`.
//!
//! # Design
//! - The chain engine is not part of this crate; it only has to implement
//!   `StepContext`.
//! - `HttpClient` is the I/O seam. `UreqClient` is the default; tests swap
//!   in canned clients.
//! - `interpret` is pure, so status and parse rules are tested without I/O.
//! - Requests and responses are plain owned data and serialize with serde so
//!   they can be passed between steps as JSON values.

pub mod client;
pub mod context;
pub mod error;
pub mod http;
pub mod methods;
pub mod step;

pub use client::{ClientConfig, HttpClient, UreqClient};
pub use context::{OptionsInput, PreviousResult, StepContext};
pub use error::{StepError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use methods::RequestMethods;
pub use step::{interpret, RequestStep, ResponseMode, StepOutput};
