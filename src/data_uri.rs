//! `data:` URIs for panel images.

use base64::Engine;
use base64::engine::general_purpose;
use image::ImageFormat;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Sniffs `bytes` and wraps them as `data:<mime>;base64,<payload>`.
///
/// Returns `None` when the bytes are not a recognisable image.
pub fn encode_image(bytes: &[u8]) -> Option<String> {
    let format = image::guess_format(bytes).ok()?;
    Some(encode(format, bytes))
}

/// Wraps `bytes` as a base64 `data:` URI for the given format.
pub fn encode(format: ImageFormat, bytes: &[u8]) -> String {
    format!(
        "{DATA_PREFIX}{}{BASE64_MARKER}{}",
        format.to_mime_type(),
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Splits a base64 `data:` URI into its mime type and decoded bytes.
pub fn decode(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix(DATA_PREFIX)?;
    let (mime, payload) = rest.split_once(BASE64_MARKER)?;
    if mime.is_empty() {
        return None;
    }
    let bytes = general_purpose::STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}
