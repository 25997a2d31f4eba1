//! Signature checks for incoming gateway callbacks.
//!
//! A callback carries the encoded payload in `data` and a detached
//! signature over that exact string in a second field:
//!
//! ```text
//! data={safe_base64_payload}&sign={safe_base64_signature}
//! ```
//!
//! Two schemes are provided:
//!
//! * **RSA** ([`RsaSignChecker`]): PKCS#1 v1.5 with SHA-1 against the
//!   gateway's public key. This is what the gateway sends as `ss2`.
//! * **HMAC** ([`HmacSignChecker`]): `HMAC-SHA256(data, secret)` for
//!   integrations that share a secret instead.

use ring::hmac;
use ring::signature::{RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY, UnparsedPublicKey};

use crate::callback::{DATA_FIELD, RawCallbackRequest};
use crate::codec;

/// Default request field carrying the signature.
pub const DEFAULT_SIGN_FIELD: &str = "sign";

/// Decides whether a raw callback request was signed by the gateway.
///
/// Implementations report only pass/fail; the reason a signature was
/// refused is never surfaced to the validator.
pub trait SignChecker {
    fn check_sign(&self, request: &RawCallbackRequest) -> bool;
}

impl<F> SignChecker for F
where
    F: Fn(&RawCallbackRequest) -> bool,
{
    fn check_sign(&self, request: &RawCallbackRequest) -> bool {
        self(request)
    }
}

/// Pull `data` and the decoded signature bytes out of a request.
fn signed_parts<'a>(
    request: &'a RawCallbackRequest,
    sign_field: &str,
) -> Option<(&'a str, Vec<u8>)> {
    let data = request.get(DATA_FIELD)?;
    let Some(sign) = request.get(sign_field) else {
        tracing::debug!(sign_field, "callback has no signature field");
        return None;
    };
    match codec::decode_safe_url_base64_bytes(sign) {
        Ok(signature) => Some((data.as_str(), signature)),
        Err(_) => {
            tracing::debug!(sign_field, "callback signature is not valid base64");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// RSA
// ---------------------------------------------------------------------------

/// Verifies RSA PKCS#1 v1.5 / SHA-1 signatures over the `data` field.
#[derive(Debug, Clone)]
pub struct RsaSignChecker {
    /// DER-encoded `RSAPublicKey` (PKCS#1).
    public_key: Box<[u8]>,
    sign_field: String,
}

impl RsaSignChecker {
    /// Create a checker from a DER-encoded PKCS#1 RSA public key.
    pub fn new(public_key_der: impl Into<Box<[u8]>>) -> Self {
        Self {
            public_key: public_key_der.into(),
            sign_field: DEFAULT_SIGN_FIELD.to_string(),
        }
    }

    /// Read the signature from `field` instead of [`DEFAULT_SIGN_FIELD`].
    pub fn with_sign_field(mut self, field: impl Into<String>) -> Self {
        self.sign_field = field.into();
        self
    }

    pub fn sign_field(&self) -> &str {
        &self.sign_field
    }
}

impl SignChecker for RsaSignChecker {
    fn check_sign(&self, request: &RawCallbackRequest) -> bool {
        let Some((data, signature)) = signed_parts(request, &self.sign_field) else {
            return false;
        };
        UnparsedPublicKey::new(
            &RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
            &*self.public_key,
        )
        .verify(data.as_bytes(), &signature)
        .is_ok()
    }
}

// ---------------------------------------------------------------------------
// HMAC
// ---------------------------------------------------------------------------

/// Verifies `HMAC-SHA256(data, secret)` signatures.
#[derive(Debug, Clone)]
pub struct HmacSignChecker {
    key: hmac::Key,
    sign_field: String,
}

impl HmacSignChecker {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            sign_field: DEFAULT_SIGN_FIELD.to_string(),
        }
    }

    /// Read the signature from `field` instead of [`DEFAULT_SIGN_FIELD`].
    pub fn with_sign_field(mut self, field: impl Into<String>) -> Self {
        self.sign_field = field.into();
        self
    }

    pub fn sign_field(&self) -> &str {
        &self.sign_field
    }

    /// Produce the safe-base64 signature the gateway would send for `data`.
    pub fn sign(&self, data: &str) -> String {
        let tag = hmac::sign(&self.key, data.as_bytes());
        codec::encode_safe_url_base64(tag.as_ref())
    }
}

impl SignChecker for HmacSignChecker {
    fn check_sign(&self, request: &RawCallbackRequest) -> bool {
        let Some((data, signature)) = signed_parts(request, &self.sign_field) else {
            return false;
        };
        hmac::verify(&self.key, data.as_bytes(), &signature).is_ok()
    }
}
