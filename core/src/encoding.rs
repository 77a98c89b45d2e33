//! Flat parameter encodings.
//!
//! # Design
//! The encoding mode decides two things: the default `Content-Type` (see
//! [`crate::headers`]) and where the parameter map ends up.
//!
//! - `Json`: the map becomes a JSON object body, for every verb. An empty
//!   map still sends `{}`.
//! - `UrlForm`: GET and DELETE append the map to the query string; other
//!   verbs send it as a form body. Nested documents use bracket keys
//!   (`a[b]=1`, `list[]=x`) and booleans encode as `1`/`0`.
//!
//! Binary kinds (bytes, files, images) have no flat representation and are
//! skipped with a warning; use the multipart executor for them.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ApiError;
use crate::http::{HttpMethod, RequestBody};
use crate::params::Params;

/// How the parameter map is serialized into the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterEncoding {
    Json,
    UrlForm,
}

impl ParameterEncoding {
    /// Default `Content-Type` advertised for this mode.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::UrlForm => "application/x-www-form-urlencoded",
        }
    }

    /// Encoding a verb uses when the caller does not choose one.
    pub fn default_for(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get | HttpMethod::Delete => Self::UrlForm,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => Self::Json,
        }
    }
}

/// Where the encoded parameters go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedParams {
    /// Query string (without `?`) to append to the URL.
    pub query: Option<String>,
    pub body: RequestBody,
}

/// Serialize `params` for `method` under `encoding`.
pub fn encode_parameters(
    method: HttpMethod,
    encoding: ParameterEncoding,
    params: &Params,
) -> Result<EncodedParams, ApiError> {
    match encoding {
        ParameterEncoding::Json => {
            let object = json_object(params);
            let body = serde_json::to_string(&Value::Object(object))
                .map_err(|e| ApiError::Encoding(e.to_string()))?;
            Ok(EncodedParams { query: None, body: RequestBody::Json(body) })
        }
        ParameterEncoding::UrlForm => {
            let encoded = form_encode(params);
            if method.encodes_in_url() {
                let query = (!encoded.is_empty()).then_some(encoded);
                Ok(EncodedParams { query, body: RequestBody::Empty })
            } else {
                Ok(EncodedParams { query: None, body: RequestBody::Form(encoded) })
            }
        }
    }
}

/// JSON object view of the map, without binary kinds.
pub(crate) fn json_object(params: &Params) -> Map<String, Value> {
    let mut object = Map::new();
    for (key, value) in params {
        match value.to_json() {
            Some(json) => {
                object.insert(key.clone(), json);
            }
            None => warn!(key = %key, kind = value.kind(), "skipping binary parameter in JSON body"),
        }
    }
    object
}

/// `application/x-www-form-urlencoded` text for the map.
pub fn form_encode(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value.to_json() {
            Some(json) => flatten(key, &json, &mut pairs),
            None => warn!(key = %key, kind = value.kind(), "skipping binary parameter in form encoding"),
        }
    }
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn flatten(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => out.push((key.to_string(), String::new())),
        Value::Bool(b) => out.push((key.to_string(), if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key.to_string(), n.to_string())),
        Value::String(s) => out.push((key.to_string(), s.clone())),
        Value::Array(items) => {
            let nested = format!("{key}[]");
            for item in items {
                flatten(&nested, item, out);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(&format!("{key}[{sub}]"), item, out);
            }
        }
    }
}
