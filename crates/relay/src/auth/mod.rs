//! Time-based one-time-password authorization gate.
//!
//! A single shared secret, configured at startup, gates the upload endpoint.
//! The verifier is a pure function of `(code, secret, now)` — it keeps no
//! ledger of codes it has seen, so a valid code verifies repeatedly within
//! its time window. Replay tracking is an explicit non-goal.

pub mod totp;

pub use totp::{unix_now, Algorithm, TotpParams, TotpVerifier};
