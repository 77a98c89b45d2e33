//! Request parameters.
//!
//! # Design
//! The parameter map is shared by the flat encoders and the multipart
//! builder, so a value can be anything either of them understands. The set
//! of kinds is closed: each encoder matches exhaustively and documents what
//! it does with the kinds it cannot carry.

use std::collections::BTreeMap;
use std::path::PathBuf;

use bytes::Bytes;
use image::DynamicImage;

/// Parameter map keyed by field name. Key order carries no meaning; the
/// `BTreeMap` only makes encoded output deterministic.
pub type Params = BTreeMap<String, ParamValue>;

/// A single request parameter.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// Plain text. The only scalar kind a multipart form accepts.
    Text(String),
    /// Number, boolean, null or a nested document/array.
    Json(serde_json::Value),
    /// Raw binary payload, uploaded as a file part.
    Bytes(Bytes),
    /// Path to a local file whose contents are uploaded.
    File(PathBuf),
    /// Decoded image, re-encoded as JPEG before upload.
    Image(DynamicImage),
}

impl ParamValue {
    /// Short kind name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Json(_) => "json",
            Self::Bytes(_) => "bytes",
            Self::File(_) => "file",
            Self::Image(_) => "image",
        }
    }

    /// JSON form of the value, if it has one. Binary kinds have none.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::Text(s) => Some(serde_json::Value::String(s.clone())),
            Self::Json(v) => Some(v.clone()),
            Self::Bytes(_) | Self::File(_) | Self::Image(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Json(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Json(value.into())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Json(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Json(value.into())
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for ParamValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<PathBuf> for ParamValue {
    fn from(value: PathBuf) -> Self {
        Self::File(value)
    }
}

impl From<DynamicImage> for ParamValue {
    fn from(value: DynamicImage) -> Self {
        Self::Image(value)
    }
}
