//! File extension to content-type mapping for multipart uploads.

/// Content type used when an extension is unknown.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type for a file extension (without the dot), matched
/// case-insensitively. Unknown extensions resolve to `None`.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        // Images. `jpg` keeps the non-standard `image/jpg` label.
        "jpeg" => "image/jpeg",
        "jpg" => "image/jpg",
        "png" => "image/png",
        "gif" => "image/gif",

        // Video
        "3gpp" | "3gp" => "video/3gpp",
        "ts" => "video/mp2t",
        "mp4" => "video/mp4",
        "mpeg" => "video/mpeg",
        "mpg" => "video/mpg",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "m4v" => "video/x-m4v",
        "mng" => "video/x-mng",
        "asx" | "asf" => "video/x-ms-asf",
        "wmv" => "video/x-ms-wmv",
        "avi" => "video/x-msvideo",

        // Documents
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "doc" => "application/msword",
        "pdf" => "application/pdf",
        "txt" => "text/plain",

        _ => return None,
    };
    Some(mime)
}

/// Like [`mime_for_extension`] but never empty.
pub fn mime_or_octet_stream(ext: &str) -> &'static str {
    mime_for_extension(ext).unwrap_or(OCTET_STREAM)
}
