//! `multipart/form-data` construction.
//!
//! # Design
//! The form is encoded in-crate into a single buffer so the transport knows
//! the total length up front and can report upload progress as it streams
//! the bytes. Parts are built from the parameter map by value kind:
//!
//! - `Image`: re-encoded as JPEG at the configured quality.
//! - `Bytes`: sent as is, labelled `image/jpeg`.
//! - `File`: contents read from disk, content type from the extension.
//! - `Text`: UTF-8 field without a file name.
//! - `Json`: not representable in a form; ignored.
//!
//! Parts that fail to build (unreadable file, image encoder error) are
//! logged and skipped; the upload goes ahead with the rest.

use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::mime::mime_or_octet_stream;
use crate::params::{ParamValue, Params};

const JPEG_EXT: &str = "jpeg";

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: Bytes::copy_from_slice(value.as_bytes()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        }
    }
}

/// An ordered set of parts sharing one boundary.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<FormPart>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("rsapi.boundary.{}", Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    /// Build a form from a parameter map. See the module docs for how each
    /// value kind is handled.
    pub async fn from_params(params: &Params, jpeg_quality: u8) -> Self {
        let mut form = Self::new();
        for (key, value) in params {
            match value {
                ParamValue::Image(image) => match encode_jpeg(image, jpeg_quality) {
                    Ok(data) => form.push(FormPart::file(
                        key.as_str(),
                        upload_file_name(JPEG_EXT),
                        mime_or_octet_stream(JPEG_EXT),
                        data,
                    )),
                    Err(e) => warn!(key = %key, error = %e, "image re-encode failed, skipping part"),
                },
                ParamValue::Bytes(data) => form.push(FormPart::file(
                    key.as_str(),
                    upload_file_name(JPEG_EXT),
                    mime_or_octet_stream(JPEG_EXT),
                    data.clone(),
                )),
                ParamValue::File(path) => match tokio::fs::read(path).await {
                    Ok(contents) => {
                        let ext = extension_of(path);
                        form.push(FormPart::file(
                            key.as_str(),
                            upload_file_name(&ext),
                            mime_or_octet_stream(&ext),
                            Bytes::from(contents),
                        ));
                    }
                    Err(e) => warn!(key = %key, path = %path.display(), error = %e, "multipart file read failed"),
                },
                ParamValue::Text(text) => form.push(FormPart::text(key.as_str(), text)),
                ParamValue::Json(_) => {
                    debug!(key = %key, kind = value.kind(), "unsupported multipart value ignored")
                }
            }
        }
        form
    }

    pub fn push(&mut self, part: FormPart) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Wire encoding of the whole form.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        for part in &self.parts {
            buf.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", escape_quoted(&part.name));
            if let Some(file_name) = &part.file_name {
                disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(file_name)));
            }
            buf.put_slice(disposition.as_bytes());
            buf.put_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                buf.put_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        buf.freeze()
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Bytes, image::ImageError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
    Ok(Bytes::from(out))
}

/// Lower-cased extension of `path`, empty when it has none.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// `<unix seconds with microseconds>.<ext>`, unique enough per upload.
fn upload_file_name(ext: &str) -> String {
    let now = chrono::Utc::now();
    format!("{}.{:06}.{ext}", now.timestamp(), now.timestamp_subsec_micros())
}
