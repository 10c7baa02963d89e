//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and either an expected parse result or an expected error. Comparing parsed
//! JSON (not raw strings) avoids false negatives from field-ordering
//! differences.

use hospital_core::drafts::NewStaffMember;
use hospital_core::types::StaffMember;
use hospital_core::{routes, ApiClient, ApiError, ClientConfig, HttpMethod, HttpRequest, HttpResponse, SearchParams};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000/api";

fn client() -> ApiClient {
    ApiClient::new(&ClientConfig::new(BASE_URL))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

/// Method, path, headers and body of a built request against `expected_request`.
fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    if let Some(headers) = expected.get("headers") {
        let expected_headers: Vec<(String, String)> = headers
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
    }

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn assert_error(name: &str, err: &ApiError, expected: &Value) {
    let message = expected["message"].as_str().unwrap();
    match expected["kind"].as_str().unwrap() {
        "NotFound" => assert!(matches!(err, ApiError::NotFound(_)), "{name}: expected NotFound, got {err:?}"),
        "Http" => {
            let status = expected["status"].as_u64().unwrap() as u16;
            assert!(
                matches!(err, ApiError::Http { status: s, .. } if *s == status),
                "{name}: expected Http {status}, got {err:?}"
            );
        }
        "Rejected" => assert!(matches!(err, ApiError::Rejected(_)), "{name}: expected Rejected, got {err:?}"),
        other => panic!("{name}: unknown expected_error: {other}"),
    }
    assert_eq!(err.to_string(), message, "{name}: message");
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn search_test_vectors() {
    let raw = include_str!("../../test-vectors/search.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let params = case["params"]
            .as_array()
            .unwrap()
            .iter()
            .fold(SearchParams::new(), |params, pair| {
                params.param(pair[0].as_str().unwrap(), pair[1].as_str().unwrap())
            });

        let req = c.build_search(case["route"].as_str().unwrap(), &params);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse::<Vec<Value>>(simulated(case)).and_then(|e| e.into_data());
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, &result.unwrap_err(), expected_error);
        } else {
            let expected: Vec<Value> = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_staff_test_vectors() {
    let raw = include_str!("../../test-vectors/create_staff.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: NewStaffMember = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create(routes::STAFF, &input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse::<StaffMember>(simulated(case)).and_then(|e| e.into_data());
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, &result.unwrap_err(), expected_error);
        } else {
            let expected: StaffMember = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Verbs
// ---------------------------------------------------------------------------

#[test]
fn action_test_vectors() {
    let raw = include_str!("../../test-vectors/actions.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let req = c
            .build_action(
                parse_method(case["method"].as_str().unwrap()),
                case["route"].as_str().unwrap(),
                case["id"].as_str().unwrap(),
                case["verb"].as_str().unwrap(),
                case.get("body"),
            )
            .unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse::<Value>(simulated(case)).and_then(|e| e.into_data());
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, &result.unwrap_err(), expected_error);
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    let raw = include_str!("../../test-vectors/delete.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let req = c.build_delete(case["route"].as_str().unwrap(), case["id"].as_str().unwrap());
        assert_request(name, &req, &case["expected_request"]);
        assert!(req.headers.is_empty(), "{name}: delete sends no headers");

        let result = c.parse_empty(simulated(case));
        match case.get("expected_error") {
            Some(expected_error) => assert_error(name, &result.unwrap_err(), expected_error),
            None => result.unwrap(),
        }
    }
}
