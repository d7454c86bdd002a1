//! Configuration loading and validation for the relay service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;

use crate::auth::totp;

/// Validated relay service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base32-encoded TOTP shared secret gating the upload endpoint. **Required.**
    pub totp_secret: String,

    /// Hash algorithm for TOTP codes: `"sha1"`, `"sha256"`, or `"sha512"`.
    #[serde(default = "default_totp_algorithm")]
    pub totp_algorithm: String,

    /// Number of digits in a TOTP code.
    #[serde(default = "default_totp_digits")]
    pub totp_digits: u32,

    /// TOTP time-step duration in seconds.
    #[serde(default = "default_totp_step_secs")]
    pub totp_step_secs: u64,

    /// Clock-skew tolerance in steps, each direction.
    #[serde(default = "default_totp_skew_steps")]
    pub totp_skew_steps: u64,

    /// Recipient address all uploads are forwarded to. **Required.**
    pub target_email: String,

    /// `From` header on outgoing mail.
    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    /// Resend API key. **Required.**
    pub resend_api_key: String,

    /// Resend send endpoint.
    #[serde(default = "default_resend_endpoint")]
    pub resend_endpoint: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_totp_algorithm() -> String {
    "sha1".into()
}
fn default_totp_digits() -> u32 {
    totp::DEFAULT_DIGITS
}
fn default_totp_step_secs() -> u64 {
    totp::DEFAULT_STEP_SECS
}
fn default_totp_skew_steps() -> u64 {
    totp::DEFAULT_SKEW_STEPS
}
fn default_mail_from() -> String {
    "Beam <beam@localhost>".into()
}
fn default_resend_endpoint() -> String {
    "https://api.resend.com/emails".into()
}
fn default_http_port() -> u16 {
    8080
}
fn default_max_upload_bytes() -> usize {
    // 25 MiB — attachments beyond this bounce at every mainstream mail host.
    25 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.totp_secret, "TOTP_SECRET")?;
        ensure_non_empty(&self.target_email, "TARGET_EMAIL")?;
        ensure_non_empty(&self.resend_api_key, "RESEND_API_KEY")?;
        ensure_non_empty(&self.resend_endpoint, "RESEND_ENDPOINT")?;

        totp::decode_secret(&self.totp_secret)
            .map_err(|e| anyhow::anyhow!("TOTP_SECRET is invalid: {e}"))?;
        totp::Algorithm::from_str(&self.totp_algorithm)
            .map_err(|e| anyhow::anyhow!("TOTP_ALGORITHM is invalid: {e}"))?;

        if !(6..=8).contains(&self.totp_digits) {
            anyhow::bail!("TOTP_DIGITS must be between 6 and 8");
        }
        if self.totp_step_secs == 0 {
            anyhow::bail!("TOTP_STEP_SECS must be > 0");
        }
        if !self.target_email.contains('@') {
            anyhow::bail!("TARGET_EMAIL must be an email address");
        }
        if self.max_upload_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_BYTES must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            totp_secret: "JBSWY3DPEHPK3PXP".into(),
            totp_algorithm: default_totp_algorithm(),
            totp_digits: default_totp_digits(),
            totp_step_secs: default_totp_step_secs(),
            totp_skew_steps: default_totp_skew_steps(),
            target_email: "inbox@example.com".into(),
            mail_from: default_mail_from(),
            resend_api_key: "re_test_key".into(),
            resend_endpoint: default_resend_endpoint(),
            http_port: default_http_port(),
            max_upload_bytes: default_max_upload_bytes(),
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_totp_algorithm(), "sha1");
        assert_eq!(default_totp_digits(), 6);
        assert_eq!(default_totp_step_secs(), 30);
        assert_eq!(default_totp_skew_steps(), 1);
        assert_eq!(default_resend_endpoint(), "https://api.resend.com/emails");
        assert_eq!(default_http_port(), 8080);
        assert_eq!(default_max_upload_bytes(), 25 * 1024 * 1024);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_secret() {
        let cfg = Config {
            totp_secret: "".into(),
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_base32_secret() {
        let cfg = Config {
            totp_secret: "not a base32 secret!".into(),
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_algorithm() {
        let cfg = Config {
            totp_algorithm: "md5".into(),
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_email() {
        let cfg = Config {
            target_email: "not-an-address".into(),
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_digits() {
        let cfg = Config {
            totp_digits: 9,
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }
}
