//! Decoding of the callback `data` blob.
//!
//! The gateway encodes the payload as a query string (`projectid=1&orderid=..`)
//! wrapped in base64 with the URL-safe alphabet, keeping the `=` padding.

use std::borrow::Cow;

use crate::callback::CallbackData;
use crate::error::CallbackError;

/// Decoder/parser used by [`CallbackValidator`](crate::CallbackValidator).
pub trait PayloadCodec {
    /// Decode a safe-URL base64 string into text.
    fn decode_safe_url_base64(&self, text: &str) -> Result<String, CallbackError>;

    /// Parse a flat query string into a field map.
    fn parse_http_query(&self, text: &str) -> Result<CallbackData, CallbackError>;
}

/// The gateway's wire format: safe base64 around a query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCodec;

impl PayloadCodec for QueryCodec {
    fn decode_safe_url_base64(&self, text: &str) -> Result<String, CallbackError> {
        decode_safe_url_base64(text)
    }

    fn parse_http_query(&self, text: &str) -> Result<CallbackData, CallbackError> {
        parse_http_query(text)
    }
}

/// Decode safe-URL base64 into UTF-8 text.
pub fn decode_safe_url_base64(text: &str) -> Result<String, CallbackError> {
    let bytes = decode_safe_url_base64_bytes(text)?;
    String::from_utf8(bytes)
        .map_err(|_| CallbackError::malformed("decoded data is not valid UTF-8"))
}

/// Decode safe-URL base64 into raw bytes.
///
/// Both alphabets are accepted (`-`/`_` and `+`/`/`). Padding is optional,
/// but when present it must bring the length to a multiple of four. Unused
/// bits in the final character must be zero.
pub fn decode_safe_url_base64_bytes(text: &str) -> Result<Vec<u8>, CallbackError> {
    let unpadded = text.trim_end_matches('=');
    let padding = text.len() - unpadded.len();
    if padding > 2 || (padding > 0 && text.len() % 4 != 0) {
        return Err(CallbackError::malformed("invalid base64 padding"));
    }

    let normalized: String = unpadded
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    fast32::base64::RFC4648_URL_NOPAD
        .decode_str(&normalized)
        .map_err(|_| CallbackError::malformed("invalid base64 encoding"))
}

/// Encode bytes the way the gateway does: URL-safe alphabet, padded.
pub fn encode_safe_url_base64(bytes: &[u8]) -> String {
    let mut encoded = fast32::base64::RFC4648_URL_NOPAD.encode(bytes);
    while encoded.len() % 4 != 0 {
        encoded.push('=');
    }
    encoded
}

/// Parse `key=value&key=value` into a field map.
///
/// `+` means space and `%XX` sequences are decoded in both keys and values.
/// Empty segments are skipped, a segment without `=` yields an empty value,
/// and the last occurrence of a repeated key wins.
pub fn parse_http_query(text: &str) -> Result<CallbackData, CallbackError> {
    let mut fields = CallbackData::new();
    for segment in text.split('&').filter(|segment| !segment.is_empty()) {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        let key = percent_decode(key)?;
        if key.is_empty() {
            return Err(CallbackError::malformed("query field without a name"));
        }
        fields.insert(key, percent_decode(value)?);
    }
    Ok(fields)
}

fn percent_decode(raw: &str) -> Result<String, CallbackError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|_| CallbackError::malformed("percent-encoded value is not valid UTF-8"))
}
