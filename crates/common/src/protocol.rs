//! Request and response types exchanged between components.
//!
//! These types are serialised as JSON over the public HTTP API and inside the
//! email attachments the relay produces.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Encrypted envelope — wire form
// ---------------------------------------------------------------------------

/// Transport encoding of one encrypted payload.
///
/// Each binary field travels independently as standard base64 (RFC 4648,
/// with padding); the three fields are siblings in one JSON object, never
/// concatenated into a single blob. Field names match the envelope format
/// emitted by the browser-side encryption client (`iv` / `encryptedData` /
/// `key`).
///
/// The raw symmetric key deliberately travels with the ciphertext: the
/// envelope is opaque to a relay that stores and forwards without looking
/// inside, and nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    /// Base64-encoded 12-byte initialization vector.
    pub iv: String,
    /// Base64-encoded ciphertext with the 16-byte authentication tag appended.
    pub encrypted_data: String,
    /// Base64-encoded 32-byte AES-256 key.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Upload endpoint
// ---------------------------------------------------------------------------

/// Successful response body for `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Always `true` on a 2xx response.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
    /// Number of files accepted and forwarded.
    pub files: usize,
    /// Server-assigned id for this upload, echoed in logs.
    pub upload_id: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"`.
    pub status: String,
    /// Crate version of the running binary.
    pub version: String,
}
