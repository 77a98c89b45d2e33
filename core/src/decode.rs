//! Typed decoding of response bodies.
//!
//! # Design
//! A successful decode also produces the generic document for the same body
//! (object form, else array-wrapped) so callers can inspect what the server
//! sent. Failures are classified into [`DecodeFailureKind`] from the
//! `serde_json` error category and message, and carry the path of the field
//! that failed (`specs.year`, `[1].name`, `.` for the root). The executor
//! only logs them.

use serde::de::DeserializeOwned;
use serde_json::error::Category;
use thiserror::Error;

use crate::normalize::{object_or_array_document, Document};

/// Why a typed decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeFailureKind {
    /// The body is not valid JSON, or holds a value the type rejects outright.
    CorruptedPayload,
    /// A required key is absent.
    MissingField,
    /// A required value is `null`.
    ValueAbsent,
    /// A value has the wrong JSON type.
    TypeMismatch,
    Other,
}

impl std::fmt::Display for DecodeFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CorruptedPayload => "data corrupted",
            Self::MissingField => "key not found",
            Self::ValueAbsent => "value not found",
            Self::TypeMismatch => "type mismatch",
            Self::Other => "decoding error",
        };
        f.write_str(name)
    }
}

/// A classified typed-decode failure with the field path and position it
/// stopped at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {path}: {message}")]
pub struct DecodeFailure {
    pub kind: DecodeFailureKind,
    pub path: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

const ROOT_PATH: &str = ".";

impl DecodeFailure {
    fn at(path: String, err: &serde_json::Error) -> Self {
        Self {
            kind: classify(err),
            path,
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

impl From<serde_json::Error> for DecodeFailure {
    fn from(err: serde_json::Error) -> Self {
        Self::at(ROOT_PATH.to_string(), &err)
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeFailure {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        Self::at(err.path().to_string(), err.inner())
    }
}

fn classify(err: &serde_json::Error) -> DecodeFailureKind {
    match err.classify() {
        Category::Syntax | Category::Eof => DecodeFailureKind::CorruptedPayload,
        Category::Io => DecodeFailureKind::Other,
        Category::Data => {
            let msg = err.to_string();
            if msg.starts_with("missing field") {
                DecodeFailureKind::MissingField
            } else if msg.starts_with("invalid type: null") {
                DecodeFailureKind::ValueAbsent
            } else if msg.starts_with("invalid type") || msg.starts_with("invalid length") {
                DecodeFailureKind::TypeMismatch
            } else if msg.starts_with("unknown variant") || msg.starts_with("invalid value") {
                DecodeFailureKind::CorruptedPayload
            } else {
                DecodeFailureKind::Other
            }
        }
    }
}

/// Successful typed decode plus the best-effort generic view of the body.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub value: T,
    pub document: Option<Document>,
}

/// Decode `body` into `T`.
pub fn decode_typed<T: DeserializeOwned>(body: &str) -> Result<Decoded<T>, DecodeFailure> {
    let mut de = serde_json::Deserializer::from_str(body);
    let value: T = serde_path_to_error::deserialize(&mut de)?;
    // Trailing characters after the value.
    de.end()?;
    Ok(Decoded { value, document: object_or_array_document(body) })
}
