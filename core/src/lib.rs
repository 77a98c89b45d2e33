//! Asynchronous REST client core with a fixed completion contract.
//!
//! # Overview
//! Every request runs through one pipeline: a reachability gate, a dispatch
//! bracketed by a busy indicator, status classification with user-facing
//! messages, and body normalization or typed decoding. Each dispatch that
//! passes the gate resolves to exactly one [`Completion`]:
//! `(outcome, transport error, generic document, typed value)`.
//!
//! # Design
//! - [`ApiClient`] is an injectable service object; clones share state.
//! - Side effects the pipeline does not own (loader, notifications,
//!   reachability) are traits in [`collaborators`] supplied by the host.
//! - Requests and responses are plain data ([`HttpRequest`],
//!   [`HttpResponse`]); the network sits behind the [`Transport`] trait so
//!   the pipeline is testable without sockets.
//! - In-flight requests are tracked for cancellation by [`RequestTracker`].

pub mod collaborators;
pub mod config;
pub mod decode;
pub mod encoding;
pub mod error;
pub mod executor;
pub mod headers;
pub mod http;
pub mod mime;
pub mod multipart;
pub mod normalize;
pub mod params;
pub mod status;
pub mod tracker;
pub mod transport;

pub use collaborators::{BusyIndicator, Notifier, Reachability, Severity};
pub use config::ClientConfig;
pub use decode::{decode_typed, DecodeFailure, DecodeFailureKind};
pub use encoding::ParameterEncoding;
pub use error::ApiError;
pub use executor::{ApiClient, ApiClientBuilder, ApiRequest, Completion, Outcome, UploadRequest};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use normalize::{normalize_body, Document};
pub use params::{ParamValue, Params};
pub use status::HttpErrorKind;
pub use tracker::{RequestHandle, RequestId, RequestTracker};
pub use transport::{ReqwestTransport, Transport, UploadProgress};
