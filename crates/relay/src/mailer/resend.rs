//! Resend (`POST /emails`) implementation of [`MailRelay`].
//!
//! Plain hyper client over rustls with webpki roots. The Resend API takes a
//! JSON body with the attachment content base64-encoded; a 2xx answer
//! carries the provider-assigned message id.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MailError, MailRelay, MailReceipt, OutgoingMail};

/// HTTPS client for the Resend email API.
pub struct ResendMailer {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    endpoint: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    /// Build a mailer for the given endpoint, API key, and `From` address.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_only()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The API key stays out of debug output.
        f.debug_struct("ResendMailer")
            .field("endpoint", &self.endpoint)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MailRelay for ResendMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<MailReceipt, MailError> {
        let body = SendRequest::from_mail(&self.from, &mail);
        let json = serde_json::to_vec(&body)
            .map_err(|e| MailError::BadResponse(format!("request serialisation: {e}")))?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(json)))
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .to_bytes();

        if !status.is_success() {
            return Err(MailError::Rejected {
                status: status.as_u16(),
            });
        }

        let receipt: SendResponse = serde_json::from_slice(&bytes)
            .map_err(|e| MailError::BadResponse(e.to_string()))?;
        debug!(message_id = %receipt.id, "mail accepted by relay");
        Ok(MailReceipt { id: receipt.id })
    }
}

// ---------------------------------------------------------------------------
// Resend API body types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    attachments: Vec<AttachmentBody>,
}

#[derive(Debug, Serialize)]
struct AttachmentBody {
    filename: String,
    /// Base64-encoded attachment bytes, as the API requires.
    content: String,
}

impl<'a> SendRequest<'a> {
    fn from_mail(from: &'a str, mail: &'a OutgoingMail) -> Self {
        Self {
            from,
            to: vec![mail.to.as_str()],
            subject: &mail.subject,
            html: &mail.html,
            attachments: mail
                .attachments
                .iter()
                .map(|a| AttachmentBody {
                    filename: a.filename.clone(),
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}
