//! Verify `interpret` against JSON test vectors stored in `test-vectors/`.
//!
//! Each case gives a mode, a simulated response and either the expected
//! result or the expected error message. Results are compared as parsed JSON.

use chain_request::{interpret, HttpResponse, ResponseMode, StepOutput};

fn parse_mode(s: &str) -> ResponseMode {
    match s {
        "raw" => ResponseMode::Raw,
        "text" => ResponseMode::Text,
        "json" => ResponseMode::Json,
        other => panic!("unknown mode: {other}"),
    }
}

#[test]
fn interpret_test_vectors() {
    let raw = include_str!("../../test-vectors/interpret.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mode = parse_mode(case["mode"].as_str().unwrap());
        let response = HttpResponse {
            status: case["response"]["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["response"]["body"].as_str().unwrap().to_string(),
        };
        let expected = &case["expected"];

        match interpret(mode, Ok(response)) {
            Ok(StepOutput::Response(resp)) => {
                assert_eq!(resp.status as u64, expected["ok"]["status"], "{name}: status");
                assert_eq!(resp.body, expected["ok"]["body"], "{name}: body");
            }
            Ok(StepOutput::Body(body)) => {
                assert_eq!(body, expected["ok"], "{name}: body");
            }
            Ok(StepOutput::Json(value)) => {
                assert_eq!(value, expected["ok"], "{name}: json");
            }
            Err(err) => {
                assert_eq!(err.to_string(), expected["error"], "{name}: error");
            }
        }
    }
}
