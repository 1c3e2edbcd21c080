//! HTTP mapping for [`RelayError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use contact_relay_utils::{ErrorResponse, RejectionStatus, RelayError};
use tracing::{error, warn};

/// A `RelayError` paired with the status it should be answered with.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: RelayError,
}

impl ApiError {
    pub fn new(error: RelayError, policy: RejectionStatus) -> Self {
        let status = StatusCode::from_u16(error.http_status_code_with(policy))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.error.is_user_visible() {
            warn!(status = %self.status, error = %self.error, "Rejected contact request");
            (self.status, Json(ErrorResponse::from(self.error))).into_response()
        } else {
            // Transport details stay in the logs.
            error!(error = %self.error, "Internal error while handling request");
            let generic = RelayError::internal("request could not be processed");
            (self.status, Json(ErrorResponse::from(generic))).into_response()
        }
    }
}
