//! `beam-relay` — service binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the tracing subscriber.
//! 3. Build the TOTP verifier from the shared secret.
//! 4. Build the outbound mail relay client.
//! 5. Build the Axum router and start the HTTP server.

mod auth;
mod config;
mod crypto;
mod mailer;
mod server;
mod telemetry;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use auth::{TotpParams, TotpVerifier};
use config::Config;
use mailer::ResendMailer;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        http_port = cfg.http_port,
        "beam-relay starting"
    );

    // -----------------------------------------------------------------------
    // 3. Authorization gate
    // -----------------------------------------------------------------------
    let verifier = TotpVerifier::new(
        &cfg.totp_secret,
        TotpParams {
            algorithm: auth::Algorithm::from_str(&cfg.totp_algorithm)?,
            digits: cfg.totp_digits,
            step_secs: cfg.totp_step_secs,
            skew_steps: cfg.totp_skew_steps,
        },
    )?;

    // -----------------------------------------------------------------------
    // 4. Mail relay client
    // -----------------------------------------------------------------------
    let mailer = Arc::new(ResendMailer::new(
        cfg.resend_endpoint.clone(),
        cfg.resend_api_key.clone(),
        cfg.mail_from.clone(),
    ));

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(verifier, mailer, cfg.target_email.clone());
    let router = server::router::build(state, cfg.max_upload_bytes);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.http_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
