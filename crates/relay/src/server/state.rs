//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::auth::TotpVerifier;
use crate::mailer::MailRelay;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped) so that Axum can clone
/// the state for each request without copying expensive data. Everything here
/// is read-only after startup — handlers never coordinate through it.
#[derive(Clone)]
pub struct AppState {
    /// Verifier holding the process-wide TOTP shared secret.
    pub verifier: Arc<TotpVerifier>,
    /// Outbound email collaborator.
    pub mailer: Arc<dyn MailRelay>,
    /// Recipient address all uploads are forwarded to.
    pub target_email: Arc<String>,
}

impl AppState {
    /// Create a new [`AppState`] from the startup-constructed components.
    pub fn new(verifier: TotpVerifier, mailer: Arc<dyn MailRelay>, target_email: String) -> Self {
        Self {
            verifier: Arc::new(verifier),
            mailer,
            target_email: Arc::new(target_email),
        }
    }
}
