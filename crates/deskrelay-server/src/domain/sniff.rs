//! Image content-type detection from magic bytes.
//!
//! The relay never trusts or validates uploads; it only needs a plausible
//! `Content-Type` for each multipart part so the browser decodes it.

pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";
pub const WEBP: &str = "image/webp";
pub const OCTET_STREAM: &str = "application/octet-stream";

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Returns the MIME type implied by the leading bytes of `bytes`.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        JPEG
    } else if bytes.starts_with(PNG_SIGNATURE) {
        PNG
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        WEBP
    } else {
        OCTET_STREAM
    }
}
