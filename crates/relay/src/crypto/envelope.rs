//! AES-256-GCM encryption and decryption of self-contained payload envelopes.
//!
//! **Algorithm choice:** AES-256-GCM provides confidentiality and integrity
//! in one primitive and avoids the padding-oracle class of failures of
//! unauthenticated block-cipher modes. The 96-bit IV is the length the mode
//! is specified for; any other length changes the internal IV derivation and
//! must not be used.
//!
//! A fresh key and IV are generated per call. Neither is ever persisted or
//! reused: the key exists only to travel inside the one envelope it sealed.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::WireEnvelope;
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM initialization vector (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// One encrypted payload: IV, ciphertext+tag, and the key that sealed it.
///
/// The key travelling with the data is deliberate — the envelope only has to
/// be opaque to a relay that stores and forwards without inspecting it. A
/// design that kept the key off the wire would need a secret shared between
/// sender and recipient, which this system does not have.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Raw IV bytes, freshly generated per encryption.
    pub iv: [u8; NONCE_LEN],
    /// Raw ciphertext + authentication tag bytes.
    pub ciphertext: Vec<u8>,
    /// Raw AES-256 key bytes, freshly generated per encryption.
    pub key: [u8; KEY_LEN],
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.debug_struct("Envelope")
            .field("iv", &self.iv)
            .field("ciphertext_len", &self.ciphertext.len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Envelope {
    /// Encode this envelope to its transport representation.
    ///
    /// Each field is standard base64 (RFC 4648, with padding); the fields
    /// travel as siblings, never concatenated.
    pub fn to_wire(&self) -> WireEnvelope {
        WireEnvelope {
            iv: STANDARD.encode(self.iv),
            encrypted_data: STANDARD.encode(&self.ciphertext),
            key: STANDARD.encode(self.key),
        }
    }

    /// Parse a transport envelope back into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidEncoding`] if any field is not valid
    /// base64, [`CipherError::InvalidKeyLength`] / [`CipherError::InvalidIvLength`]
    /// if the key or IV decodes to the wrong number of bytes, and
    /// [`CipherError::TruncatedCiphertext`] if the ciphertext is shorter than
    /// the authentication tag.
    pub fn from_wire(wire: &WireEnvelope) -> Result<Self, CipherError> {
        let iv_bytes = STANDARD
            .decode(&wire.iv)
            .map_err(|_| CipherError::InvalidEncoding)?;
        let iv: [u8; NONCE_LEN] = iv_bytes
            .try_into()
            .map_err(|_| CipherError::InvalidIvLength)?;

        let key_bytes = STANDARD
            .decode(&wire.key)
            .map_err(|_| CipherError::InvalidEncoding)?;
        let key: [u8; KEY_LEN] = key_bytes
            .try_into()
            .map_err(|_| CipherError::InvalidKeyLength)?;

        let ciphertext = STANDARD
            .decode(&wire.encrypted_data)
            .map_err(|_| CipherError::InvalidEncoding)?;
        if ciphertext.len() < TAG_LEN {
            return Err(CipherError::TruncatedCiphertext);
        }

        Ok(Self { iv, ciphertext, key })
    }
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// An envelope field is not valid base64.
    #[error("envelope field is not valid base64")]
    InvalidEncoding,

    /// The key does not decode to [`KEY_LEN`] bytes.
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// The IV does not decode to [`NONCE_LEN`] bytes.
    #[error("invalid iv length: expected {NONCE_LEN} bytes")]
    InvalidIvLength,

    /// The ciphertext is shorter than the authentication tag.
    #[error("ciphertext shorter than the {TAG_LEN}-byte authentication tag")]
    TruncatedCiphertext,

    /// Authenticated decryption failed. Deliberately carries no detail on
    /// which of key, IV, or ciphertext was the mismatched component.
    #[error("aead operation failed")]
    AeadFailure,

    /// The OS secure random source is unavailable. Fatal to encryption;
    /// there is no fallback to a weaker source.
    #[error("secure random source unavailable")]
    Entropy,
}

/// Encrypt a payload under a fresh key and IV using AES-256-GCM.
///
/// Both the 256-bit key and the 96-bit IV are drawn from the OS CSPRNG on
/// every call; two encryptions of the same plaintext share nothing. No
/// associated data is used. The only side effect is consuming entropy.
///
/// # Errors
///
/// Returns [`CipherError::Entropy`] if the OS random source fails, and
/// [`CipherError::AeadFailure`] on an internal AEAD error (unreachable with
/// a well-formed key and IV).
pub fn encrypt(plaintext: &[u8]) -> Result<Envelope, CipherError> {
    use aes_gcm::aead::rand_core::RngCore;

    let mut key = [0u8; KEY_LEN];
    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|_| CipherError::Entropy)?;
    let mut iv = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|_| CipherError::Entropy)?;

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::InvalidKeyLength)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CipherError::AeadFailure)?;

    Ok(Envelope { iv, ciphertext, key })
}

/// Decrypt an [`Envelope`] back to the exact original plaintext bytes.
///
/// The authentication tag is verified before any plaintext is returned; a
/// mismatch anywhere (wrong key, flipped ciphertext bit, wrong IV, truncated
/// input) fails the operation as a unit. Partial or garbage plaintext is
/// never returned.
///
/// # Errors
///
/// Returns [`CipherError::AeadFailure`] if authentication fails.
pub fn decrypt(envelope: &Envelope) -> Result<Vec<u8>, CipherError> {
    let cipher =
        Aes256Gcm::new_from_slice(&envelope.key).map_err(|_| CipherError::InvalidKeyLength)?;
    cipher
        .decrypt(Nonce::from_slice(&envelope.iv), envelope.ciphertext.as_ref())
        .map_err(|_| CipherError::AeadFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let envelope = encrypt(b"hello beam").unwrap();
        assert_eq!(decrypt(&envelope).unwrap(), b"hello beam");
    }

    #[test]
    fn round_trip_empty_payload() {
        let envelope = encrypt(b"").unwrap();
        // Empty plaintext still carries a full authentication tag.
        assert_eq!(envelope.ciphertext.len(), TAG_LEN);
        assert_eq!(decrypt(&envelope).unwrap(), b"");
    }

    #[test]
    fn round_trip_single_byte() {
        let envelope = encrypt(b"x").unwrap();
        assert_eq!(envelope.ciphertext.len(), 1 + TAG_LEN);
        assert_eq!(decrypt(&envelope).unwrap(), b"x");
    }

    #[test]
    fn round_trip_large_payload() {
        let payload: Vec<u8> = (0..2 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
        let envelope = encrypt(&payload).unwrap();
        assert_eq!(decrypt(&envelope).unwrap(), payload);
    }

    #[test]
    fn fresh_key_and_iv_per_call() {
        let mut keys = HashSet::new();
        let mut ivs = HashSet::new();
        for _ in 0..1000 {
            let envelope = encrypt(b"same plaintext").unwrap();
            assert!(keys.insert(envelope.key), "key collision across calls");
            assert!(ivs.insert(envelope.iv), "iv collision across calls");
        }
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        let envelope = encrypt(b"tamper detection payload").unwrap();
        for byte in 0..envelope.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.ciphertext[byte] ^= 1 << bit;
                assert!(
                    decrypt(&tampered).is_err(),
                    "bit {bit} of ciphertext byte {byte} flipped undetected"
                );
            }
        }
    }

    #[test]
    fn tampered_iv_fails_auth() {
        let envelope = encrypt(b"tamper detection payload").unwrap();
        for byte in 0..NONCE_LEN {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.iv[byte] ^= 1 << bit;
                assert!(decrypt(&tampered).is_err());
            }
        }
    }

    #[test]
    fn tampered_key_fails_auth() {
        let envelope = encrypt(b"tamper detection payload").unwrap();
        for byte in 0..KEY_LEN {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.key[byte] ^= 1 << bit;
                assert!(decrypt(&tampered).is_err());
            }
        }
    }

    #[test]
    fn cross_key_isolation() {
        let a = encrypt(b"payload a").unwrap();
        let b = encrypt(b"payload b").unwrap();
        let mixed = Envelope {
            iv: a.iv,
            ciphertext: a.ciphertext.clone(),
            key: b.key,
        };
        assert!(decrypt(&mixed).is_err());
    }

    #[test]
    fn wire_round_trip_through_json() {
        let envelope = encrypt(b"hello beam").unwrap();
        let json = serde_json::to_string(&envelope.to_wire()).unwrap();
        let wire: WireEnvelope = serde_json::from_str(&json).unwrap();
        let parsed = Envelope::from_wire(&wire).unwrap();
        assert_eq!(parsed, envelope);
        assert_eq!(decrypt(&parsed).unwrap(), b"hello beam");
    }

    #[test]
    fn wire_encoding_is_standard_base64_with_padding() {
        let envelope = encrypt(b"hello beam").unwrap();
        let wire = envelope.to_wire();
        // 32 key bytes are not a multiple of 3, so the standard encoding
        // must carry padding.
        assert!(wire.key.ends_with('='));
        assert_eq!(STANDARD.decode(&wire.key).unwrap().len(), KEY_LEN);
        assert_eq!(STANDARD.decode(&wire.iv).unwrap().len(), NONCE_LEN);
    }

    #[test]
    fn from_wire_rejects_bad_base64() {
        let mut wire = encrypt(b"x").unwrap().to_wire();
        wire.encrypted_data = "!!!not base64!!!".into();
        assert!(matches!(
            Envelope::from_wire(&wire),
            Err(CipherError::InvalidEncoding)
        ));
    }

    #[test]
    fn from_wire_rejects_short_key() {
        let mut wire = encrypt(b"x").unwrap().to_wire();
        wire.key = STANDARD.encode([0u8; 31]);
        assert!(matches!(
            Envelope::from_wire(&wire),
            Err(CipherError::InvalidKeyLength)
        ));
    }

    #[test]
    fn from_wire_rejects_wrong_iv_length() {
        let mut wire = encrypt(b"x").unwrap().to_wire();
        wire.iv = STANDARD.encode([0u8; 16]);
        assert!(matches!(
            Envelope::from_wire(&wire),
            Err(CipherError::InvalidIvLength)
        ));
    }

    #[test]
    fn from_wire_rejects_truncated_ciphertext() {
        let mut wire = encrypt(b"x").unwrap().to_wire();
        wire.encrypted_data = STANDARD.encode([0u8; TAG_LEN - 1]);
        assert!(matches!(
            Envelope::from_wire(&wire),
            Err(CipherError::TruncatedCiphertext)
        ));
    }

    #[test]
    fn debug_redacts_key_material() {
        let envelope = encrypt(b"secret").unwrap();
        let dbg = format!("{envelope:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains(&format!("{:?}", envelope.key)));
    }
}
