//! TOTP (RFC 6238) code generation and verification.
//!
//! Codes are HMAC-based one-time passwords (RFC 4226) computed over the
//! current 30-second time step. Verification tolerates exactly one step of
//! clock skew in each direction and compares codes in constant time, with
//! the match accumulated across the whole window so that timing does not
//! reveal which step matched.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::{Choice, ConstantTimeEq};
use thiserror::Error;

/// Default number of code digits.
pub const DEFAULT_DIGITS: u32 = 6;

/// Default time-step duration in seconds.
pub const DEFAULT_STEP_SECS: u64 = 30;

/// Default skew tolerance, in steps, in each direction.
pub const DEFAULT_SKEW_STEPS: u64 = 1;

/// HMAC hash algorithm used to derive codes.
///
/// Both sides must agree; SHA-1 is the conventional default used by
/// authenticator apps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl FromStr for Algorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Algorithm::Sha1),
            "sha256" => Ok(Algorithm::Sha256),
            "sha512" => Ok(Algorithm::Sha512),
            other => Err(AuthError::UnknownAlgorithm(other.to_owned())),
        }
    }
}

/// Errors produced when constructing a [`TotpVerifier`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// The shared secret is empty or not valid base32.
    #[error("shared secret is not valid base32")]
    InvalidSecret,

    /// The configured hash algorithm name is not recognised.
    #[error("unknown TOTP algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The configured digit count is outside the supported 6..=8 range.
    #[error("unsupported digit count: {0} (expected 6..=8)")]
    InvalidDigits(u32),

    /// The configured step duration is zero.
    #[error("step duration must be > 0 seconds")]
    InvalidStep,
}

/// Tunable TOTP parameters. All three must match the code-generating side.
#[derive(Debug, Clone, Copy)]
pub struct TotpParams {
    pub algorithm: Algorithm,
    pub digits: u32,
    pub step_secs: u64,
    pub skew_steps: u64,
}

impl Default for TotpParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Sha1,
            digits: DEFAULT_DIGITS,
            step_secs: DEFAULT_STEP_SECS,
            skew_steps: DEFAULT_SKEW_STEPS,
        }
    }
}

/// Stateless verifier for time-based one-time passwords.
///
/// Holds the decoded shared secret and the agreed parameters; everything
/// else is derived per call from the supplied timestamp. Safe to share
/// across tasks — verification takes `&self` and mutates nothing.
pub struct TotpVerifier {
    secret: Vec<u8>,
    algorithm: Algorithm,
    digits: u32,
    step_secs: u64,
    skew_steps: u64,
}

impl std::fmt::Debug for TotpVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The shared secret must never reach logs.
        f.debug_struct("TotpVerifier")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("digits", &self.digits)
            .field("step_secs", &self.step_secs)
            .field("skew_steps", &self.skew_steps)
            .finish()
    }
}

impl TotpVerifier {
    /// Build a verifier from a base32-encoded shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSecret`] if the secret is empty or not
    /// valid base32, [`AuthError::InvalidDigits`] for a digit count outside
    /// 6..=8, and [`AuthError::InvalidStep`] for a zero step duration.
    pub fn new(secret_base32: &str, params: TotpParams) -> Result<Self, AuthError> {
        let secret = decode_secret(secret_base32)?;
        if !(6..=8).contains(&params.digits) {
            return Err(AuthError::InvalidDigits(params.digits));
        }
        if params.step_secs == 0 {
            return Err(AuthError::InvalidStep);
        }
        Ok(Self {
            secret,
            algorithm: params.algorithm,
            digits: params.digits,
            step_secs: params.step_secs,
            skew_steps: params.skew_steps,
        })
    }

    /// Returns `true` iff `code` is valid for the current time step or one
    /// of the immediately adjacent steps.
    ///
    /// Malformed codes (wrong length, non-digit characters) return `false`
    /// without error. Candidate comparisons are constant-time and the match
    /// result is accumulated across the whole window, so neither the match
    /// position nor the mismatch point leaks through timing.
    pub fn verify(&self, code: &str, now_unix: u64) -> bool {
        if code.len() != self.digits as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let step = now_unix / self.step_secs;
        let first = step.saturating_sub(self.skew_steps);
        let last = step.saturating_add(self.skew_steps);

        let mut matched = Choice::from(0u8);
        for candidate in first..=last {
            let expected = self.code_for_step(candidate);
            matched |= expected.as_bytes().ct_eq(code.as_bytes());
        }
        matched.into()
    }

    /// Generate the code valid at `now_unix`.
    pub fn generate(&self, now_unix: u64) -> String {
        self.code_for_step(now_unix / self.step_secs)
    }

    /// RFC 4226 HOTP for a single time step, zero-padded to the configured
    /// digit count.
    fn code_for_step(&self, step: u64) -> String {
        let digest = self.hmac_counter(step);

        // Dynamic truncation: the low nibble of the last byte selects a
        // 31-bit big-endian word inside the digest.
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);

        let code = binary % 10u32.pow(self.digits);
        format!("{code:0width$}", width = self.digits as usize)
    }

    fn hmac_counter(&self, counter: u64) -> Vec<u8> {
        let msg = counter.to_be_bytes();
        match self.algorithm {
            Algorithm::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(&self.secret)
                    .expect("HMAC can take key of any size");
                mac.update(&msg);
                mac.finalize().into_bytes().to_vec()
            }
            Algorithm::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
                    .expect("HMAC can take key of any size");
                mac.update(&msg);
                mac.finalize().into_bytes().to_vec()
            }
            Algorithm::Sha512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(&self.secret)
                    .expect("HMAC can take key of any size");
                mac.update(&msg);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }
}

/// Decode a base32 shared secret (RFC 4648 alphabet).
///
/// Case-insensitive; trailing `=` padding is ignored, matching how
/// authenticator apps present secrets for transcription.
///
/// # Errors
///
/// Returns [`AuthError::InvalidSecret`] if the input is empty or contains
/// characters outside the base32 alphabet.
pub fn decode_secret(secret_base32: &str) -> Result<Vec<u8>, AuthError> {
    let normalized = secret_base32
        .trim()
        .trim_end_matches('=')
        .to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|_| AuthError::InvalidSecret)
}

/// Current wall-clock time as seconds since the Unix epoch.
///
/// A clock set before the epoch collapses to step 0, which simply fails
/// verification.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RFC 6238 appendix B seed ("12345678901234567890") in base32.
    const RFC_SEED_SHA1: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn verifier(secret: &str, params: TotpParams) -> TotpVerifier {
        TotpVerifier::new(secret, params).unwrap()
    }

    #[test]
    fn rfc6238_sha1_vectors() {
        let v = verifier(
            RFC_SEED_SHA1,
            TotpParams {
                digits: 8,
                ..TotpParams::default()
            },
        );
        assert_eq!(v.generate(59), "94287082");
        assert_eq!(v.generate(1_111_111_109), "07081804");
        assert_eq!(v.generate(1_111_111_111), "14050471");
        assert_eq!(v.generate(1_234_567_890), "89005924");
        assert_eq!(v.generate(2_000_000_000), "69279037");
        assert_eq!(v.generate(20_000_000_000), "65353130");
    }

    #[test]
    fn rfc6238_sha256_vector() {
        let seed = BASE32_NOPAD.encode(b"12345678901234567890123456789012");
        let v = verifier(
            &seed,
            TotpParams {
                algorithm: Algorithm::Sha256,
                digits: 8,
                ..TotpParams::default()
            },
        );
        assert_eq!(v.generate(59), "46119246");
        assert_eq!(v.generate(1_111_111_109), "68084774");
    }

    #[test]
    fn rfc6238_sha512_vector() {
        let seed = BASE32_NOPAD
            .encode(b"1234567890123456789012345678901234567890123456789012345678901234");
        let v = verifier(
            &seed,
            TotpParams {
                algorithm: Algorithm::Sha512,
                digits: 8,
                ..TotpParams::default()
            },
        );
        assert_eq!(v.generate(59), "90693936");
    }

    #[test]
    fn valid_within_skew_window() {
        let v = verifier("JBSWY3DPEHPK3PXP", TotpParams::default());
        // A step boundary, so ±30 s lands exactly one step away.
        let t0 = 1_111_111_110;
        let code = v.generate(t0);

        assert!(v.verify(&code, t0));
        assert!(v.verify(&code, t0 + 30));
        assert!(v.verify(&code, t0 - 30));
    }

    #[test]
    fn rejected_beyond_skew_window() {
        let v = verifier("JBSWY3DPEHPK3PXP", TotpParams::default());
        let t0 = 1_111_111_110;
        let code = v.generate(t0);

        assert!(!v.verify(&code, t0 + 60));
        assert!(!v.verify(&code, t0 + 90));
        assert!(!v.verify(&code, t0 - 60));
    }

    #[test]
    fn malformed_codes_rejected_without_panic() {
        let v = verifier("JBSWY3DPEHPK3PXP", TotpParams::default());
        let now = 1_111_111_110;
        assert!(!v.verify("abc123", now));
        assert!(!v.verify("12", now));
        assert!(!v.verify("", now));
        assert!(!v.verify("1234567", now));
        assert!(!v.verify("12345６", now)); // full-width digit
    }

    #[test]
    fn wrong_secret_rejected() {
        let a = verifier("JBSWY3DPEHPK3PXP", TotpParams::default());
        let b = verifier("GEZDGNBVGY3TQOJQ", TotpParams::default());
        let t0 = 1_111_111_110;
        let code = a.generate(t0);
        assert!(!b.verify(&code, t0));
    }

    #[test]
    fn replay_within_window_is_allowed() {
        // No ledger of seen codes is kept — documented design limit.
        let v = verifier("JBSWY3DPEHPK3PXP", TotpParams::default());
        let t0 = 1_111_111_110;
        let code = v.generate(t0);
        assert!(v.verify(&code, t0));
        assert!(v.verify(&code, t0 + 1));
    }

    #[test]
    fn decode_secret_is_case_insensitive() {
        assert_eq!(
            decode_secret("jbswy3dpehpk3pxp").unwrap(),
            decode_secret("JBSWY3DPEHPK3PXP").unwrap()
        );
    }

    #[test]
    fn decode_secret_ignores_padding() {
        assert_eq!(decode_secret("MFRGG===").unwrap(), b"abc");
    }

    #[test]
    fn decode_secret_rejects_garbage() {
        assert!(decode_secret("not!base32").is_err());
        assert!(decode_secret("").is_err());
        assert!(decode_secret("====").is_err());
    }

    #[test]
    fn constructor_validates_parameters() {
        assert!(matches!(
            TotpVerifier::new(
                "JBSWY3DPEHPK3PXP",
                TotpParams {
                    digits: 5,
                    ..TotpParams::default()
                }
            ),
            Err(AuthError::InvalidDigits(5))
        ));
        assert!(matches!(
            TotpVerifier::new(
                "JBSWY3DPEHPK3PXP",
                TotpParams {
                    step_secs: 0,
                    ..TotpParams::default()
                }
            ),
            Err(AuthError::InvalidStep)
        ));
        assert!(matches!(
            TotpVerifier::new("", TotpParams::default()),
            Err(AuthError::InvalidSecret)
        ));
    }

    #[test]
    fn algorithm_from_str() {
        assert_eq!(Algorithm::from_str("sha1").unwrap(), Algorithm::Sha1);
        assert_eq!(Algorithm::from_str("SHA256").unwrap(), Algorithm::Sha256);
        assert!(Algorithm::from_str("md5").is_err());
    }
}
