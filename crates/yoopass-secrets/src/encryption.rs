//! Cryptographic operations for sealing secrets.
//!
//! This module provides authenticated encryption using AES-128-GCM.
//! It supports:
//! - Per-secret key generation from the OS random source
//! - Hex rendering and parsing of keys for transport
//! - Authenticated encryption with a fresh random nonce on every call
//!
//! The server never keeps a key: it is handed back to the creator inside a
//! [`SecretHandle`](crate::types::SecretHandle) and supplied again on read.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CipherError;

/// Size of the encryption key in bytes (128 bits).
pub const KEY_SIZE: usize = 16;

/// Size of the nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// Length of a hex-encoded key.
pub const KEY_HEX_LEN: usize = KEY_SIZE * 2;

/// A per-secret decryption key.
///
/// The key is securely zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Generates a new random key from the operating system's CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a `SecretKey` from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the byte slice is not exactly 16 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() != KEY_SIZE {
            return Err(CipherError::InvalidKeyFormat {
                reason: format!("key must be exactly {KEY_SIZE} bytes, got {}", bytes.len()),
            });
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Parses a key from its hex rendering.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyFormat`] if the input is not hex or
    /// does not decode to exactly 16 bytes.
    pub fn from_hex(encoded: &str) -> Result<Self, CipherError> {
        if encoded.len() != KEY_HEX_LEN {
            return Err(CipherError::InvalidKeyFormat {
                reason: format!(
                    "key must be {KEY_HEX_LEN} hex characters, got {}",
                    encoded.len()
                ),
            });
        }

        let mut bytes = [0u8; KEY_SIZE];
        hex::decode_to_slice(encoded, &mut bytes).map_err(|e| CipherError::InvalidKeyFormat {
            reason: e.to_string(),
        })?;
        Ok(Self { bytes })
    }

    /// Renders the key as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Returns the key bytes as a slice.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generates a fresh key. Alias for [`SecretKey::generate`].
#[must_use]
pub fn generate_key() -> SecretKey {
    SecretKey::generate()
}

fn cipher_for(key: &SecretKey) -> Result<Aes128Gcm, CipherError> {
    Aes128Gcm::new_from_slice(&key.bytes).map_err(|e| CipherError::InvalidKeyFormat {
        reason: e.to_string(),
    })
}

/// Encrypts plaintext using AES-128-GCM.
///
/// A new nonce is drawn for every call, so sealing the same plaintext twice
/// under one key yields different output.
///
/// The output format is: `nonce || ciphertext || tag`
///
/// # Errors
///
/// Returns an error if encryption fails.
pub fn encrypt(key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CipherError::EncryptionFailed {
            reason: e.to_string(),
        })?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);

    Ok(output)
}

/// Decrypts a payload that was sealed with [`encrypt`].
///
/// Expects the input format: `nonce || ciphertext || tag`
///
/// # Errors
///
/// Returns an error if:
/// - The payload is shorter than a nonce ([`CipherError::Truncated`])
/// - The tag does not verify ([`CipherError::AuthenticationFailed`])
pub fn decrypt(key: &SecretKey, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
    if sealed.len() < NONCE_SIZE {
        return Err(CipherError::Truncated {
            expected: NONCE_SIZE,
            actual: sealed.len(),
        });
    }

    let cipher = cipher_for(key)?;

    let (nonce_bytes, encrypted) = sealed.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, encrypted)
        .map_err(|_| CipherError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test]
    fn secret_key_generate() {
        let key1 = SecretKey::generate();
        let key2 = SecretKey::generate();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn secret_key_hex_is_fixed_length_lowercase() {
        let key = generate_key();
        let encoded = key.to_hex();

        assert_eq!(encoded.len(), KEY_HEX_LEN);
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

        let parsed = SecretKey::from_hex(&encoded).expect("should parse");
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn secret_key_from_hex_accepts_uppercase() {
        let parsed = SecretKey::from_hex("00112233445566778899AABBCCDDEEFF").expect("valid hex");
        assert_eq!(parsed.to_hex(), "00112233445566778899aabbccddeeff");
    }

    #[test_case("" ; "empty")]
    #[test_case("abcd" ; "too short")]
    #[test_case("00112233445566778899aabbccddeeff00" ; "too long")]
    #[test_case("zz112233445566778899aabbccddeeff" ; "not hex")]
    #[test_case("00112233445566778899aabbccddeeé" ; "non ascii")]
    fn secret_key_from_hex_rejects(input: &str) {
        let result = SecretKey::from_hex(input);
        assert!(matches!(result, Err(CipherError::InvalidKeyFormat { .. })));
    }

    #[test]
    fn secret_key_from_bytes_wrong_length() {
        assert!(SecretKey::from_bytes(&[0u8; 32]).is_err());
        assert!(SecretKey::from_bytes(&[0u8; 8]).is_err());
        assert!(SecretKey::from_bytes(&[7u8; KEY_SIZE]).is_ok());
    }

    #[test]
    fn secret_key_debug_redacts() {
        let key = SecretKey::generate();
        let debug_str = format!("{key:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains(&key.to_hex()));
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = SecretKey::generate();
        let plaintext = b"hello, world!";

        let sealed = encrypt(&key, plaintext).expect("encryption should succeed");
        let opened = decrypt(&key, &sealed).expect("decryption should succeed");

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn encrypt_produces_different_ciphertexts() {
        let key = SecretKey::generate();
        let plaintext = b"same message";

        let ct1 = encrypt(&key, plaintext).expect("encrypt 1");
        let ct2 = encrypt(&key, plaintext).expect("encrypt 2");

        assert_ne!(ct1, ct2);
        assert_eq!(decrypt(&key, &ct1).expect("decrypt 1"), plaintext);
        assert_eq!(decrypt(&key, &ct2).expect("decrypt 2"), plaintext);
    }

    #[test]
    fn nonces_never_repeat_under_one_key() {
        let key = SecretKey::generate();
        let mut seen = HashSet::new();

        for _ in 0..10_000 {
            let sealed = encrypt(&key, b"x").expect("encrypt");
            let nonce: [u8; NONCE_SIZE] = sealed[..NONCE_SIZE].try_into().expect("nonce slice");
            assert!(seen.insert(nonce), "nonce reused");
        }
    }

    #[test]
    fn decrypt_wrong_key_fails() {
        let key1 = SecretKey::generate();
        let key2 = SecretKey::generate();

        let sealed = encrypt(&key1, b"secret message").expect("encrypt");
        let result = decrypt(&key2, &sealed);

        assert_eq!(result, Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn decrypt_tampered_data_fails() {
        let key = SecretKey::generate();
        let mut sealed = encrypt(&key, b"secret message").expect("encrypt");

        if let Some(byte) = sealed.get_mut(NONCE_SIZE) {
            *byte ^= 0x01;
        }

        assert_eq!(decrypt(&key, &sealed), Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn decrypt_tampered_nonce_fails() {
        let key = SecretKey::generate();
        let mut sealed = encrypt(&key, b"secret message").expect("encrypt");
        sealed[0] ^= 0xFF;

        assert_eq!(decrypt(&key, &sealed), Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn decrypt_shorter_than_nonce_is_truncated() {
        let key = SecretKey::generate();
        let result = decrypt(&key, &[0u8; NONCE_SIZE - 1]);

        assert_eq!(
            result,
            Err(CipherError::Truncated {
                expected: NONCE_SIZE,
                actual: NONCE_SIZE - 1
            })
        );
    }

    #[test]
    fn decrypt_nonce_without_tag_fails_authentication() {
        let key = SecretKey::generate();
        let result = decrypt(&key, &[0u8; NONCE_SIZE + TAG_SIZE - 1]);

        assert_eq!(result, Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn encrypt_empty_plaintext() {
        let key = SecretKey::generate();

        let sealed = encrypt(&key, b"").expect("encrypt empty");
        let opened = decrypt(&key, &sealed).expect("decrypt empty");

        assert!(opened.is_empty());
    }

    #[test]
    fn ciphertext_length_is_predictable() {
        let key = SecretKey::generate();
        let plaintext = b"test message";

        let sealed = encrypt(&key, plaintext).expect("encrypt");

        assert_eq!(sealed.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip_any_payload(payload in proptest::collection::vec(any::<u8>(), 0..4096)) {
                let key = SecretKey::generate();
                let sealed = encrypt(&key, &payload).expect("encrypt");
                prop_assert_eq!(decrypt(&key, &sealed).expect("decrypt"), payload);
            }

            #[test]
            fn any_single_bit_flip_is_rejected(
                payload in proptest::collection::vec(any::<u8>(), 1..256),
                position in any::<prop::sample::Index>(),
                bit in 0u8..8,
            ) {
                let key = SecretKey::generate();
                let mut sealed = encrypt(&key, &payload).expect("encrypt");
                let idx = position.index(sealed.len());
                sealed[idx] ^= 1 << bit;
                prop_assert_eq!(decrypt(&key, &sealed), Err(CipherError::AuthenticationFailed));
            }
        }
    }
}
