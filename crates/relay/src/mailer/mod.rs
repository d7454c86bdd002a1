//! Outbound email delivery.
//!
//! The relay's only job after sealing the payloads is to hand them to an
//! email provider. [`MailRelay`] is that collaborator boundary: a recipient,
//! a subject, an HTML body, and named byte attachments in — a receipt or a
//! delivery error out. Handlers depend on the trait, never on the provider.

pub mod resend;

pub use resend::ResendMailer;

use async_trait::async_trait;
use thiserror::Error;

/// One file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename shown to the recipient.
    pub filename: String,
    /// Raw attachment bytes.
    pub content: Vec<u8>,
}

/// A fully-composed message ready for delivery.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Attachments, in the order they were uploaded.
    pub attachments: Vec<Attachment>,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone)]
pub struct MailReceipt {
    /// Provider-assigned message id.
    pub id: String,
}

/// Errors produced by the delivery layer.
#[derive(Debug, Error)]
pub enum MailError {
    /// The request never completed — DNS, TLS, or connection failure.
    #[error("mail transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("mail relay rejected the message: status {status}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
    },

    /// The provider's response could not be interpreted.
    #[error("unexpected mail relay response: {0}")]
    BadResponse(String),
}

/// Abstraction over the outbound email provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailRelay: Send + Sync {
    /// Deliver one message, returning the provider's receipt.
    async fn send(&self, mail: OutgoingMail) -> Result<MailReceipt, MailError>;
}
