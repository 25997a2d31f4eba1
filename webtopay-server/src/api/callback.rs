//! Gateway callback endpoint.
//!
//! The gateway calls back with `data` and a signature either in the query
//! string or as a form body. An accepted callback must be answered with the
//! plain-text body `OK`; anything else makes the gateway retry later.
//!
//! # Endpoints
//!
//! - `GET /callback`  – callback fields in the query string
//! - `POST /callback` – callback fields as `application/x-www-form-urlencoded`

use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use webtopay_sdk::{CallbackData, CallbackError, RawCallbackRequest};

use crate::state::AppState;

/// Body the gateway expects for an accepted callback.
pub const ACCEPTED_BODY: &str = "OK";

/// Build the callback router.
pub fn router() -> Router<AppState> {
    Router::new().route("/callback", get(receive_query).post(receive_form))
}

/// Rejection returned when a callback fails validation.
#[derive(Debug)]
pub struct CallbackRejection(pub CallbackError);

impl From<CallbackError> for CallbackRejection {
    fn from(err: CallbackError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CallbackRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            CallbackError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, "signature verification failed")
            }
            CallbackError::MalformedPayload(_) => {
                (StatusCode::BAD_REQUEST, "malformed callback payload")
            }
            CallbackError::ProjectMismatch { .. } => (StatusCode::FORBIDDEN, "unknown project"),
            CallbackError::UnexpectedFieldValue { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "callback fields are not as expected",
            ),
        };
        (status, message).into_response()
    }
}

/// `GET /callback`
async fn receive_query(
    State(state): State<AppState>,
    Query(request): Query<RawCallbackRequest>,
) -> Result<&'static str, CallbackRejection> {
    accept(&state, &request).await
}

/// `POST /callback`
async fn receive_form(
    State(state): State<AppState>,
    Form(request): Form<RawCallbackRequest>,
) -> Result<&'static str, CallbackRejection> {
    accept(&state, &request).await
}

async fn accept(
    state: &AppState,
    request: &RawCallbackRequest,
) -> Result<&'static str, CallbackRejection> {
    let config = state.config().await;

    let data = config
        .validator
        .validate_and_parse_data(request)
        .inspect_err(|e| log_rejection(e))?;
    config
        .validator
        .check_expected_fields(&data, &config.expected_fields)
        .inspect_err(|e| log_rejection(e))?;
    drop(config);

    tracing::info!(
        orderid = ?field(&data, "orderid"),
        status = ?field(&data, "status"),
        amount = ?field(&data, "amount"),
        currency = ?field(&data, "currency"),
        "payment callback accepted"
    );
    Ok(ACCEPTED_BODY)
}

fn field<'a>(data: &'a CallbackData, name: &str) -> &'a str {
    data.get(name).map(String::as_str).unwrap_or_default()
}

fn log_rejection(err: &CallbackError) {
    tracing::warn!(kind = err.kind(), error = ?err, "callback rejected");
}
