//! Runtime configuration built from the file config.

use std::collections::HashMap;
use webtopay_sdk::{
    CallbackValidator, HmacSignChecker, RawCallbackRequest, RsaSignChecker, SignChecker,
};

/// The signature scheme selected in the config file.
#[derive(Debug, Clone)]
pub enum CallbackSignChecker {
    Rsa(RsaSignChecker),
    Hmac(HmacSignChecker),
}

impl SignChecker for CallbackSignChecker {
    fn check_sign(&self, request: &RawCallbackRequest) -> bool {
        match self {
            CallbackSignChecker::Rsa(checker) => checker.check_sign(request),
            CallbackSignChecker::Hmac(checker) => checker.check_sign(request),
        }
    }
}

/// Everything a callback handler needs, swapped as a whole on reload.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub validator: CallbackValidator<CallbackSignChecker>,
    pub expected_fields: HashMap<String, String>,
}
