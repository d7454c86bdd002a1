//! Structured logging setup for the relay.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, key material, or shared secret** must appear in any log
//!   field. The crypto and auth types redact themselves in `Debug` output as
//!   a second line of defence.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::init_telemetry;
