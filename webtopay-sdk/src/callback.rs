//! Callback validation.
//!
//! [`CallbackValidator`] is the trust boundary between an inbound gateway
//! request and the merchant's order logic. A [`CallbackData`] map is only
//! handed out after the signature and the project id both check out.

use std::collections::HashMap;
use std::fmt;

use crate::codec::{PayloadCodec, QueryCodec};
use crate::error::CallbackError;
use crate::signature::SignChecker;

/// Request field holding the encoded payload.
pub const DATA_FIELD: &str = "data";

/// Payload field identifying the merchant project.
pub const PROJECT_ID_FIELD: &str = "projectid";

/// Inbound request fields, as received from the HTTP layer.
pub type RawCallbackRequest = HashMap<String, String>;

/// Fields decoded from the `data` blob.
pub type CallbackData = HashMap<String, String>;

/// Merchant project identifier.
///
/// Stored in its trimmed string form so that `123` and `"123"` compare
/// equal. Leading zeros are significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl fmt::Display) -> Self {
        Self(id.to_string().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a value read from a payload names this project.
    pub fn matches(&self, candidate: &str) -> bool {
        values_match(&self.0, candidate)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<u32> for ProjectId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProjectId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Field values are compared as trimmed strings.
fn values_match(expected: &str, actual: &str) -> bool {
    expected.trim() == actual.trim()
}

/// Validates gateway callbacks for one merchant project.
///
/// Holds no mutable state, so one validator can serve concurrent requests
/// as long as its collaborators are `Sync`.
#[derive(Debug, Clone)]
pub struct CallbackValidator<S, C = QueryCodec> {
    project_id: ProjectId,
    sign_checker: S,
    codec: C,
}

impl<S: SignChecker> CallbackValidator<S, QueryCodec> {
    /// Create a validator using the gateway's standard payload encoding.
    pub fn new(project_id: impl Into<ProjectId>, sign_checker: S) -> Self {
        Self::with_codec(project_id, sign_checker, QueryCodec)
    }
}

impl<S: SignChecker, C: PayloadCodec> CallbackValidator<S, C> {
    pub fn with_codec(project_id: impl Into<ProjectId>, sign_checker: S, codec: C) -> Self {
        Self {
            project_id: project_id.into(),
            sign_checker,
            codec,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn sign_checker(&self) -> &S {
        &self.sign_checker
    }

    /// Check the signature, decode `data` and confirm the project id.
    ///
    /// Steps run in that order and stop at the first failure; nothing is
    /// decoded before the signature is accepted. On success the parsed map
    /// is returned exactly as the codec produced it.
    pub fn validate_and_parse_data(
        &self,
        request: &RawCallbackRequest,
    ) -> Result<CallbackData, CallbackError> {
        if !self.sign_checker.check_sign(request) {
            tracing::warn!(project_id = %self.project_id, "callback signature rejected");
            return Err(CallbackError::InvalidSignature);
        }

        let data = request
            .get(DATA_FIELD)
            .ok_or_else(|| CallbackError::malformed("request has no data field"))?;
        let decoded = self.codec.decode_safe_url_base64(data)?;
        let parsed = self.codec.parse_http_query(&decoded)?;

        let actual = parsed.get(PROJECT_ID_FIELD);
        if !actual.is_some_and(|id| self.project_id.matches(id)) {
            tracing::warn!(
                expected = %self.project_id,
                actual = ?actual,
                "callback belongs to another project"
            );
            return Err(CallbackError::ProjectMismatch {
                expected: self.project_id.to_string(),
                actual: actual.cloned(),
            });
        }

        tracing::debug!(
            project_id = %self.project_id,
            fields = parsed.len(),
            "callback validated"
        );
        Ok(parsed)
    }

    /// Assert that `actual` carries every field of `expected`.
    ///
    /// See [`check_expected_fields`].
    pub fn check_expected_fields<I, K, V>(
        &self,
        actual: &CallbackData,
        expected: I,
    ) -> Result<(), CallbackError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: fmt::Display,
    {
        check_expected_fields(actual, expected)
    }
}

/// Assert that `actual` carries every `(field, value)` of `expected`.
///
/// This is a subset check: fields of `actual` that are not mentioned in
/// `expected` are ignored, and an empty `expected` always passes. Values are
/// compared as trimmed strings, so `456` matches `"456"`. The first missing
/// or differing field is reported.
pub fn check_expected_fields<I, K, V>(actual: &CallbackData, expected: I) -> Result<(), CallbackError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    for (field, value) in expected {
        let field = field.as_ref();
        let value = value.to_string();
        match actual.get(field) {
            Some(found) if values_match(&value, found) => {}
            found => {
                tracing::warn!(
                    field = ?field,
                    expected = ?value,
                    actual = ?found,
                    "callback field is not as expected"
                );
                return Err(CallbackError::UnexpectedFieldValue {
                    field: field.to_string(),
                    expected: value,
                    actual: found.cloned(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::RsaSignChecker;
    use std::cell::{Cell, RefCell};

    /// Codec that records its inputs and replays canned outputs.
    #[derive(Default)]
    struct RecordingCodec {
        decoded: String,
        parsed: CallbackData,
        decode_calls: RefCell<Vec<String>>,
        parse_calls: RefCell<Vec<String>>,
    }

    impl RecordingCodec {
        fn returning(decoded: &str, parsed: CallbackData) -> Self {
            Self {
                decoded: decoded.to_string(),
                parsed,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.decode_calls.borrow().len() + self.parse_calls.borrow().len()
        }
    }

    impl PayloadCodec for RecordingCodec {
        fn decode_safe_url_base64(&self, text: &str) -> Result<String, CallbackError> {
            self.decode_calls.borrow_mut().push(text.to_string());
            Ok(self.decoded.clone())
        }

        fn parse_http_query(&self, text: &str) -> Result<CallbackData, CallbackError> {
            self.parse_calls.borrow_mut().push(text.to_string());
            Ok(self.parsed.clone())
        }
    }

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn signed_request() -> RawCallbackRequest {
        map(&[("data", "abcdef"), ("sign", "qwerty")])
    }

    #[test]
    fn test_invalid_sign_skips_decoding() {
        let request = signed_request();
        let sign_calls = Cell::new(0);
        let codec = RecordingCodec::default();
        let validator = CallbackValidator::with_codec(
            123u64,
            |seen: &RawCallbackRequest| {
                sign_calls.set(sign_calls.get() + 1);
                assert_eq!(seen, &signed_request());
                false
            },
            codec,
        );

        let result = validator.validate_and_parse_data(&request);

        assert_eq!(result, Err(CallbackError::InvalidSignature));
        assert_eq!(sign_calls.get(), 1);
        assert_eq!(validator.codec.calls(), 0);
    }

    #[test]
    fn test_project_mismatch() {
        let codec = RecordingCodec::returning("zxc", map(&[("projectid", "456")]));
        let validator =
            CallbackValidator::with_codec(123u64, |_: &RawCallbackRequest| true, codec);

        let result = validator.validate_and_parse_data(&signed_request());

        assert_eq!(
            result,
            Err(CallbackError::ProjectMismatch {
                expected: "123".to_string(),
                actual: Some("456".to_string()),
            })
        );
        assert_eq!(*validator.codec.decode_calls.borrow(), vec!["abcdef"]);
        assert_eq!(*validator.codec.parse_calls.borrow(), vec!["zxc"]);
    }

    #[test]
    fn test_missing_project_id_is_a_mismatch() {
        let codec = RecordingCodec::returning("zxc", map(&[("orderid", "1")]));
        let validator =
            CallbackValidator::with_codec(123u64, |_: &RawCallbackRequest| true, codec);

        assert_eq!(
            validator.validate_and_parse_data(&signed_request()),
            Err(CallbackError::ProjectMismatch {
                expected: "123".to_string(),
                actual: None,
            })
        );
    }

    #[test]
    fn test_validate_and_parse_data() {
        let parsed = map(&[
            ("projectid", "123"),
            ("someparam", "qwerty123"),
            ("type", "micro"),
        ]);
        let codec = RecordingCodec::returning("zxc", parsed.clone());
        let validator =
            CallbackValidator::with_codec(123u64, |_: &RawCallbackRequest| true, codec);

        assert_eq!(validator.validate_and_parse_data(&signed_request()), Ok(parsed));
        assert_eq!(validator.codec.decode_calls.borrow().len(), 1);
        assert_eq!(validator.codec.parse_calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_data_field_is_malformed() {
        let validator = CallbackValidator::new("123", |_: &RawCallbackRequest| true);
        let request = map(&[("sign", "qwerty")]);

        assert!(matches!(
            validator.validate_and_parse_data(&request),
            Err(CallbackError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_unparsable_data_is_malformed() {
        let validator = CallbackValidator::new(123u64, |_: &RawCallbackRequest| true);
        let data = crate::codec::encode_safe_url_base64(b"=orphan");
        let request = map(&[("data", data.as_str()), ("sign", "qwerty")]);

        // fails at parsing, before any project id comparison
        assert!(matches!(
            validator.validate_and_parse_data(&request),
            Err(CallbackError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_undecodable_data_is_malformed() {
        let validator = CallbackValidator::new(123u64, |_: &RawCallbackRequest| true);
        let request = map(&[("data", "***"), ("sign", "qwerty")]);

        assert!(matches!(
            validator.validate_and_parse_data(&request),
            Err(CallbackError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_real_gateway_callback() {
        let key: &[u8] = include_bytes!("../fixtures/gateway_public_key.der");
        let validator = CallbackValidator::new(123u64, RsaSignChecker::new(key));
        let request = map(&[
            ("data", include_str!("../fixtures/callback_data.txt")),
            ("sign", include_str!("../fixtures/callback_sign.txt")),
        ]);

        let data = validator.validate_and_parse_data(&request).unwrap();
        assert_eq!(data["projectid"], "123");
        assert_eq!(data["orderid"], "ORD-1001");
        assert_eq!(data["paytext"], "Order 1001 at shop");
        validator
            .check_expected_fields(&data, [("status", "1"), ("type", "macro")])
            .unwrap();
        validator
            .check_expected_fields(&data, [("amount", 2500)])
            .unwrap();

        let foreign = map(&[
            ("data", include_str!("../fixtures/foreign_project_data.txt")),
            ("sign", include_str!("../fixtures/foreign_project_sign.txt")),
        ]);
        assert!(matches!(
            validator.validate_and_parse_data(&foreign),
            Err(CallbackError::ProjectMismatch { .. })
        ));
    }

    #[test]
    fn test_project_id_normalization() {
        assert_eq!(ProjectId::from(123u64), ProjectId::from(" 123 "));
        assert!(ProjectId::from(123u32).matches("123 "));
        assert!(!ProjectId::from(123u64).matches("0123"));
        assert_eq!(ProjectId::from(String::from("abc")).as_str(), "abc");
    }

    #[test]
    fn test_check_expected_fields() {
        let actual = map(&[("abc", "123"), ("def", "456")]);

        assert!(check_expected_fields(&actual, [("def", 456)]).is_ok());
        assert!(check_expected_fields(&actual, [("def", "456")]).is_ok());
        assert!(check_expected_fields(&actual, Vec::<(&str, &str)>::new()).is_ok());

        assert_eq!(
            check_expected_fields(&actual, [("abc", "123"), ("non-existing", "789")]),
            Err(CallbackError::UnexpectedFieldValue {
                field: "non-existing".to_string(),
                expected: "789".to_string(),
                actual: None,
            })
        );

        assert_eq!(
            check_expected_fields(&actual, [("abc", "1234")]),
            Err(CallbackError::UnexpectedFieldValue {
                field: "abc".to_string(),
                expected: "1234".to_string(),
                actual: Some("123".to_string()),
            })
        );
    }

    #[test]
    fn test_check_expected_fields_from_map() {
        let validator = CallbackValidator::new(1u64, |_: &RawCallbackRequest| true);
        let actual = map(&[("status", "1"), ("currency", "EUR")]);

        assert!(validator
            .check_expected_fields(&actual, &map(&[("currency", "EUR")]))
            .is_ok());
        assert!(validator
            .check_expected_fields(&actual, &map(&[("currency", "USD")]))
            .is_err());
    }
}
