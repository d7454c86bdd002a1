//! Axum request handlers for all service endpoints.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use common::protocol::{ErrorResponse, HealthResponse, UploadResponse, WireEnvelope};
use common::ServiceError;
use tracing::{info, warn};
use uuid::Uuid;

use super::state::AppState;
use crate::auth::unix_now;
use crate::crypto::{envelope, Envelope};
use crate::mailer::{Attachment, OutgoingMail};

/// `POST /upload` — accept files, verify the one-time code, seal each payload
/// in an envelope, and forward everything to the configured recipient by email.
///
/// Multipart fields:
/// - `files` (repeated): raw payloads, encrypted server-side;
/// - `envelopes` (repeated): already-encrypted envelope JSON from a client
///   that sealed the payload itself, validated and forwarded as-is;
/// - `code`: the TOTP code.
pub async fn upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(f) => f,
        Err(e) => return service_error(&e),
    };

    if form.files.is_empty() && form.envelopes.is_empty() {
        return service_error(&ServiceError::BadRequest("no files provided".into()));
    }

    // Authorization gate: nothing is encrypted or forwarded until the code
    // checks out against the shared secret and the current time step. The
    // rejection carries no hint of why the code failed.
    let authorized = form
        .code
        .as_deref()
        .map(|code| state.verifier.verify(code, unix_now()))
        .unwrap_or(false);
    if !authorized {
        return service_error(&ServiceError::Unauthorized);
    }

    let upload_id = Uuid::new_v4();
    let total = form.files.len() + form.envelopes.len();
    let mut attachments = Vec::with_capacity(total);
    let mut listed: Vec<(String, usize)> = Vec::with_capacity(total);

    for (filename, payload) in &form.files {
        let sealed = match envelope::encrypt(payload) {
            Ok(env) => env,
            Err(e) => {
                warn!(%upload_id, error = %e, "encryption failed");
                return service_error(&ServiceError::EncryptionFailure(
                    "encryption failed".into(),
                ));
            }
        };
        let body = match serde_json::to_vec(&sealed.to_wire()) {
            Ok(b) => b,
            Err(e) => {
                warn!(%upload_id, error = %e, "envelope serialisation failed");
                return service_error(&ServiceError::Internal("failed to upload files".into()));
            }
        };
        listed.push((filename.clone(), payload.len()));
        attachments.push(Attachment {
            filename: format!("{filename}.enc.json"),
            content: body,
        });
    }

    for (filename, wire) in &form.envelopes {
        let body = match serde_json::to_vec(wire) {
            Ok(b) => b,
            Err(e) => {
                warn!(%upload_id, error = %e, "envelope serialisation failed");
                return service_error(&ServiceError::Internal("failed to upload files".into()));
            }
        };
        listed.push((filename.clone(), body.len()));
        attachments.push(Attachment {
            filename: filename.clone(),
            content: body,
        });
    }

    let mail = OutgoingMail {
        to: state.target_email.as_ref().clone(),
        subject: format!("[BEAM] New files received ({} files)", attachments.len()),
        html: message_html(&listed),
        attachments,
    };

    match state.mailer.send(mail).await {
        Ok(receipt) => {
            info!(%upload_id, message_id = %receipt.id, files = listed.len(), "upload forwarded");
            (
                StatusCode::OK,
                Json(UploadResponse {
                    success: true,
                    message: "Files uploaded and sent successfully".into(),
                    files: listed.len(),
                    upload_id: upload_id.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!(%upload_id, error = %e, "mail delivery failed");
            service_error(&ServiceError::DeliveryFailure("failed to send".into()))
        }
    }
}

/// `GET /health` — liveness check.
///
/// The verifier and mailer are constructed before the listener binds, so a
/// serving process is a ready process.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }),
    )
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Multipart form decoding
// ---------------------------------------------------------------------------

/// Decoded upload form: raw files to seal, pre-sealed envelopes to forward,
/// and the one-time code.
struct UploadForm {
    code: Option<String>,
    files: Vec<(String, Bytes)>,
    envelopes: Vec<(String, WireEnvelope)>,
}

/// Drain the multipart stream into an [`UploadForm`].
///
/// Unknown field names are ignored. Pre-sealed envelopes are structurally
/// validated (base64 + length checks) here so that a malformed one rejects
/// the whole request before any work is done on its behalf.
async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ServiceError> {
    let mut form = UploadForm {
        code: None,
        files: Vec::new(),
        envelopes: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("unreadable multipart form: {e}")))?
    {
        match field.name().unwrap_or("") {
            "code" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::BadRequest(format!("unreadable code field: {e}")))?;
                form.code = Some(text);
            }
            "files" => {
                let filename = field.file_name().unwrap_or("unnamed").to_owned();
                let payload = field.bytes().await.map_err(|e| {
                    ServiceError::BadRequest(format!("unreadable file field: {e}"))
                })?;
                form.files.push((filename, payload));
            }
            "envelopes" => {
                let filename = field.file_name().unwrap_or("envelope.json").to_owned();
                let payload = field.bytes().await.map_err(|e| {
                    ServiceError::BadRequest(format!("unreadable envelope field: {e}"))
                })?;
                let wire: WireEnvelope = serde_json::from_slice(&payload).map_err(|_| {
                    ServiceError::BadRequest(format!("{filename} is not an envelope"))
                })?;
                Envelope::from_wire(&wire).map_err(|e| {
                    ServiceError::BadRequest(format!("{filename} is not a valid envelope: {e}"))
                })?;
                form.envelopes.push((filename, wire));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Map a [`ServiceError`] to its JSON error response.
fn service_error(err: &ServiceError) -> Response {
    let status = StatusCode::from_u16(err.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(err.code(), err.to_string()))).into_response()
}

// ---------------------------------------------------------------------------
// Email body formatting
// ---------------------------------------------------------------------------

/// HTML body listing each forwarded file with a human-readable size.
fn message_html(files: &[(String, usize)]) -> String {
    let items: String = files
        .iter()
        .map(|(name, size)| format!("<li>{} ({})</li>", html_escape(name), human_size(*size)))
        .collect();
    format!(
        "<h1>New Files Received</h1>\
         <p>You have received {} new file(s) via Beam:</p>\
         <ul>{items}</ul>\
         <p>Files are attached to this email.</p>",
        files.len(),
    )
}

/// Binary-unit file size, two decimals at most, trailing zeros dropped.
fn human_size(bytes: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = (bytes as f64 / 1024f64.powi(exp as i32) * 100.0).round() / 100.0;
    format!("{value} {}", UNITS[exp])
}

/// Minimal HTML escaping for attacker-controlled filenames.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
