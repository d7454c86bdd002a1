//! AES-256-GCM envelope encryption primitives.
//!
//! This module is intentionally free of HTTP and mail dependencies.
//! It provides the seal/open operations used by the upload flow.
//!
//! # Envelope format
//!
//! ```text
//! { "iv": base64(iv), "encryptedData": base64(ciphertext+tag), "key": base64(key) }
//! ```
//!
//! Each binary field is independently base64-encoded (standard alphabet,
//! with padding); the key travels alongside the ciphertext so that the
//! recipient can open the envelope with nothing but its contents.

pub mod envelope;

pub use envelope::Envelope;
