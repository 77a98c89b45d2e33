//! Check the pure pipeline stages against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Documents are compared as parsed JSON values, never as raw strings, so
//! key order in the fixtures does not matter.

use rsapi_core::encoding::encode_parameters;
use rsapi_core::headers::required_headers;
use rsapi_core::{
    normalize_body, HttpErrorKind, HttpMethod, ParamValue, ParameterEncoding, Params, RequestBody,
};
use serde_json::Value;

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

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

fn parse_encoding(s: &str) -> ParameterEncoding {
    match s {
        "json" => ParameterEncoding::Json,
        "url_form" => ParameterEncoding::UrlForm,
        other => panic!("unknown encoding: {other}"),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string()))
        .collect()
}

#[test]
fn status_vectors() {
    for case in load(include_str!("../../test-vectors/status.json")) {
        let status = case["status"].as_u64().unwrap() as u16;
        let kind = HttpErrorKind::from_status(status);
        assert_eq!(format!("{kind:?}"), case["kind"].as_str().unwrap(), "status {status}");
        assert_eq!(kind.message(), case["message"].as_str().unwrap(), "status {status}");
    }
}

#[test]
fn normalize_vectors() {
    for case in load(include_str!("../../test-vectors/normalize.json")) {
        let name = case["name"].as_str().unwrap();
        let actual = normalize_body(case["body"].as_str().unwrap()).map(Value::Object);
        let expected = match &case["expected"] {
            Value::Null => None,
            doc => Some(doc.clone()),
        };
        assert_eq!(actual, expected, "{name}");
    }
}

#[test]
fn header_vectors() {
    for case in load(include_str!("../../test-vectors/headers.json")) {
        let name = case["name"].as_str().unwrap();
        let encoding = parse_encoding(case["encoding"].as_str().unwrap());
        let headers = required_headers(&pairs(&case["custom"]), encoding);
        assert_eq!(headers, pairs(&case["expected"]), "{name}");
    }
}

#[test]
fn encoding_vectors() {
    for case in load(include_str!("../../test-vectors/encoding.json")) {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let encoding = parse_encoding(case["encoding"].as_str().unwrap());
        let params: Params = case["params"]
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), ParamValue::from(v.clone())))
            .collect();

        let encoded = encode_parameters(method, encoding, &params).unwrap();
        assert_eq!(encoded.query.as_deref(), case["query"].as_str(), "{name}: query");

        match (&case["body"], encoded.body) {
            (Value::Null, RequestBody::Empty) => {}
            (expected, RequestBody::Form(form)) => {
                assert_eq!(Some(form.as_str()), expected["form"].as_str(), "{name}: form body")
            }
            (expected, RequestBody::Json(json)) => {
                let actual: Value = serde_json::from_str(&json).unwrap();
                assert_eq!(actual, expected["json"], "{name}: json body");
            }
            (expected, actual) => panic!("{name}: expected {expected}, got {actual:?}"),
        }
    }
}
