//! The three request steps a chain registers: `request`, `requestBody` and
//! `requestJson`.

use crate::client::{HttpClient, UreqClient};
use crate::step::{RequestStep, ResponseMode};

/// One step per `ResponseMode`, all sharing the same client.
#[derive(Clone)]
pub struct RequestMethods<C = UreqClient> {
    pub request: RequestStep<C>,
    pub request_body: RequestStep<C>,
    pub request_json: RequestStep<C>,
}

impl RequestMethods<UreqClient> {
    pub fn new() -> Self {
        Self::with_client(UreqClient::new())
    }
}

impl Default for RequestMethods<UreqClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HttpClient + Clone> RequestMethods<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            request: RequestStep::new(ResponseMode::Raw, client.clone()),
            request_body: RequestStep::new(ResponseMode::Text, client.clone()),
            request_json: RequestStep::new(ResponseMode::Json, client),
        }
    }
}

impl<C: HttpClient> RequestMethods<C> {
    /// All three steps, for registering with a chain under `RequestStep::name`.
    pub fn steps(&self) -> [&RequestStep<C>; 3] {
        [&self.request, &self.request_body, &self.request_json]
    }

    /// Look a step up by its registration name.
    pub fn get(&self, name: &str) -> Option<&RequestStep<C>> {
        self.steps().into_iter().find(|step| step.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};

    #[derive(Clone)]
    struct Unreachable;

    impl HttpClient for Unreachable {
        fn perform(&self, _: &HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::new("unreachable"))
        }
    }

    #[test]
    fn each_field_carries_its_mode() {
        let methods = RequestMethods::with_client(Unreachable);
        assert_eq!(methods.request.mode(), ResponseMode::Raw);
        assert_eq!(methods.request_body.mode(), ResponseMode::Text);
        assert_eq!(methods.request_json.mode(), ResponseMode::Json);
    }

    #[test]
    fn steps_are_found_by_chain_name() {
        let methods = RequestMethods::with_client(Unreachable);
        let names: Vec<_> = methods.steps().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["request", "requestBody", "requestJson"]);
        assert_eq!(methods.get("requestJson").map(|s| s.mode()), Some(ResponseMode::Json));
        assert!(methods.get("requestXml").is_none());
    }
}
