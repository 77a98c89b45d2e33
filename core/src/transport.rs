//! Transport seam between the pipeline and the network.
//!
//! # Design
//! The executor only ever sees [`HttpRequest`]/[`HttpResponse`] values. The
//! default [`ReqwestTransport`] maps them onto a shared `reqwest::Client`
//! (connection pooling, TLS and redirects live there). Tests plug in an
//! in-memory transport instead.
//!
//! Multipart bodies are streamed in fixed-size chunks; each chunk pulled by
//! the connection reports the cumulative fraction sent to the progress sink.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, RequestBody};

/// Upload progress sink: receives the fraction of the body sent, in `[0, 1]`,
/// never decreasing for a given request.
pub type UploadProgress = Arc<dyn Fn(f64) + Send + Sync>;

/// Chunk size used when streaming multipart bodies.
pub const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Executes one HTTP exchange. `Err` means no HTTP response was obtained;
/// any status code, including 4xx/5xx, is an `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: HttpRequest,
        progress: Option<UploadProgress>,
    ) -> Result<HttpResponse, ApiError>;
}

/// Transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        Ok(Self { client: builder.build()? })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
        progress: Option<UploadProgress>,
    ) -> Result<HttpResponse, ApiError> {
        let headers = header_map(&request.headers)?;
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), request.url.as_str())
            .headers(headers);

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) | RequestBody::Form(body) => builder.body(body),
            RequestBody::Multipart(bytes) => builder
                .header(CONTENT_LENGTH, bytes.len())
                .body(progress_body(bytes, progress)),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// Header vector to a `HeaderMap`, keeping duplicate names.
pub fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, ApiError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::InvalidHeader(format!("'{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::InvalidHeader(format!("value for '{name}': {e}")))?;
        map.append(name, value);
    }
    Ok(map)
}

/// Split `bytes` into upload chunks.
pub fn upload_chunks(bytes: &Bytes) -> Vec<Bytes> {
    (0..bytes.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len())))
        .collect()
}

fn progress_body(bytes: Bytes, progress: Option<UploadProgress>) -> reqwest::Body {
    let Some(progress) = progress else {
        return reqwest::Body::from(bytes);
    };
    let total = bytes.len();
    if total == 0 {
        progress(1.0);
        return reqwest::Body::from(bytes);
    }

    let mut sent = 0usize;
    let chunks = upload_chunks(&bytes).into_iter().map(move |chunk| {
        sent += chunk.len();
        progress(sent as f64 / total as f64);
        Ok::<_, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(futures_util::stream::iter(chunks))
}
