//! Validation of signed payment gateway callbacks.
//!
//! The gateway delivers each payment notification as a URL-safe base64 blob
//! (`data`) with a detached signature. [`CallbackValidator`] checks the
//! signature, decodes the blob into a field map, makes sure it belongs to the
//! configured project, and lets the caller assert individual field values
//! before acting on the event.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod callback;
pub mod codec;
pub mod error;
pub mod signature;

pub use callback::{
    CallbackData, CallbackValidator, DATA_FIELD, PROJECT_ID_FIELD, ProjectId, RawCallbackRequest,
    check_expected_fields,
};
pub use codec::{PayloadCodec, QueryCodec};
pub use error::CallbackError;
pub use signature::{HmacSignChecker, RsaSignChecker, SignChecker};
