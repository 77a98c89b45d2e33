//! Required header composition.
//!
//! Every request carries `Accept: application/json` and a `Content-Type`
//! derived from its body kind. Caller headers are appended after the
//! defaults and never replace them, so a caller-supplied `Content-Type`
//! travels as a second header next to the default one.

use crate::encoding::ParameterEncoding;

pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT_JSON: &str = "application/json";

/// Header set for a flat-encoded request.
pub fn required_headers(
    custom: &[(String, String)],
    encoding: ParameterEncoding,
) -> Vec<(String, String)> {
    headers_with_content_type(custom, encoding.content_type())
}

/// Header set with an explicit default `Content-Type`, used by the multipart
/// executor whose content type carries the form boundary.
pub fn headers_with_content_type(
    custom: &[(String, String)],
    content_type: &str,
) -> Vec<(String, String)> {
    let mut headers = Vec::with_capacity(custom.len() + 2);
    headers.push((ACCEPT.to_string(), ACCEPT_JSON.to_string()));
    headers.push((CONTENT_TYPE.to_string(), content_type.to_string()));
    headers.extend(custom.iter().cloned());
    headers
}
