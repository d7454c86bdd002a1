//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unauthorized`] → 401
/// - [`ServiceError::EncryptionFailure`] → 500
/// - [`ServiceError::DeliveryFailure`] → 502
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed — unreadable multipart form, missing field,
    /// or an envelope that does not decode.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The one-time code was missing or did not match any tolerated time step.
    ///
    /// The message deliberately carries no detail on *why* the code was
    /// rejected (expired vs wrong secret vs malformed).
    #[error("invalid authentication code")]
    Unauthorized,

    /// Encryption failed due to a crypto-layer error.
    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    /// The downstream mail relay refused or failed to deliver the message.
    #[error("delivery failure: {0}")]
    DeliveryFailure(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unauthorized => 401,
            ServiceError::EncryptionFailure(_) => 500,
            ServiceError::DeliveryFailure(_) => 502,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Unauthorized => "unauthorized",
            ServiceError::EncryptionFailure(_) => "internal_error",
            ServiceError::DeliveryFailure(_) => "delivery_failed",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}
