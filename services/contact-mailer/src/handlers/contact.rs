//! Contact Form Handler
//!
//! Accepts the multipart contact form, runs the attachment through the
//! upload gate and hands the submission to the dispatcher. The response does
//! not wait for, or reflect, the outcome of delivery.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
};
use contact_relay_utils::{RejectionKind, RelayError, RelayResult};
use tracing::debug;

use crate::dispatcher::ContactSubmission;
use crate::error::ApiError;
use crate::upload::{UploadGate, CV_FIELD};
use crate::AppState;

pub const SUCCESS_BODY: &str = "Message sent";

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, &'static str), ApiError> {
    let submission = read_submission(&state.upload_gate, &mut multipart)
        .await
        .map_err(|e| ApiError::new(e, state.rejection_status))?;

    debug!(
        first_name = %submission.first_name,
        last_name = %submission.last_name,
        subject = %submission.subject,
        attachment = submission.attachment.as_ref().map(|a| a.filename.as_str()),
        attachment_bytes = submission.attachment.as_ref().map(|a| a.len()),
        "Contact form received"
    );

    // Detached: dropping the handle does not cancel delivery.
    drop(state.dispatcher.dispatch(submission));

    Ok((StatusCode::OK, SUCCESS_BODY))
}

async fn read_submission(
    gate: &UploadGate,
    multipart: &mut Multipart,
) -> RelayResult<ContactSubmission> {
    let mut submission = ContactSubmission::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            // Browsers send an empty, unnamed part for an untouched file input.
            if filename.is_empty() {
                while field.chunk().await.map_err(multipart_error)?.is_some() {}
                continue;
            }
            if name != CV_FIELD || submission.attachment.is_some() {
                return Err(RelayError::upload_rejection(
                    RejectionKind::UnexpectedField,
                    format!("Unexpected file field '{}'", name),
                ));
            }

            gate.check_extension(&filename)?;
            let mut content = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(file_error)? {
                gate.check_size(content.len() + chunk.len())?;
                content.extend_from_slice(&chunk);
            }
            submission.attachment = Some(gate.accept(filename, content)?);
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "firstName" => submission.first_name = value,
            "lastName" => submission.last_name = value,
            "subject" => submission.subject = value,
            "body" => submission.body = value,
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(submission)
}

fn multipart_error(error: MultipartError) -> RelayError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::validation("request", "Request too large")
    } else {
        RelayError::validation("multipart", error.body_text())
    }
}

/// The body limit tripped while the attachment itself was streaming in.
fn file_error(error: MultipartError) -> RelayError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::upload_rejection(RejectionKind::TooLarge, "File too large")
    } else {
        multipart_error(error)
    }
}
