//! Authenticated encryption using AES-256-GCM.
//!
//! Every blob written by the vault, payload or manifest, has the layout
//! `nonce (12 bytes) || ciphertext || tag (16 bytes)`.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm,
};
use zeroize::Zeroizing;

use crate::keys::EncryptionKey;
use hideaway_common::{Error, Result};

/// Nonce size for AES-256-GCM (96-bit).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (128-bit).
pub const TAG_SIZE: usize = 16;

/// Encrypt plaintext using AES-256-GCM.
///
/// # Postconditions
/// - Returns nonce || ciphertext || tag
/// - The nonce is freshly generated from the OS RNG
/// - The output length is plaintext length + NONCE_SIZE + TAG_SIZE
///
/// # Errors
/// - Returns `Crypto` if the underlying cipher rejects the input
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// # Postconditions
/// - Returns the original plaintext in a buffer that zeroizes on drop
/// - The tag is verified before any plaintext is released
///
/// # Errors
/// - `TruncatedInput` if the blob is shorter than NONCE_SIZE
/// - `AuthenticationFailed` on any tag mismatch (wrong key or tampered data)
pub fn decrypt(key: &EncryptionKey, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if blob.len() < NONCE_SIZE {
        return Err(Error::TruncatedInput);
    }

    let (nonce_bytes, encrypted) = blob.split_at(NONCE_SIZE);
    let nonce = GenericArray::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));

    cipher
        .decrypt(nonce, encrypted)
        .map(Zeroizing::new)
        .map_err(|_| Error::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KEY_LENGTH;
    use proptest::prelude::*;

    fn key(byte: u8) -> EncryptionKey {
        EncryptionKey::from_bytes([byte; KEY_LENGTH])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let plaintext = b"Hello, World!";

        let ciphertext = encrypt(&key(42), plaintext).unwrap();
        let decrypted = decrypt(&key(42), &ciphertext).unwrap();

        assert_eq!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn test_ciphertext_size() {
        let plaintext = b"Test message";

        let ciphertext = encrypt(&key(42), plaintext).unwrap();

        assert_eq!(ciphertext.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }

    #[test]
    fn test_different_nonce_each_time() {
        let plaintext = b"Same plaintext";

        let ct1 = encrypt(&key(42), plaintext).unwrap();
        let ct2 = encrypt(&key(42), plaintext).unwrap();

        assert_ne!(&ct1[..NONCE_SIZE], &ct2[..NONCE_SIZE]);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let ciphertext = encrypt(&key(1), b"Secret data").unwrap();

        assert!(matches!(
            decrypt(&key(2), &ciphertext),
            Err(Error::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(
            decrypt(&key(42), &[0u8; NONCE_SIZE - 1]),
            Err(Error::TruncatedInput)
        ));
        assert!(matches!(decrypt(&key(42), &[]), Err(Error::TruncatedInput)));
    }

    #[test]
    fn test_nonce_only_is_auth_failure() {
        // Long enough for a nonce but missing the tag.
        assert!(matches!(
            decrypt(&key(42), &[0u8; NONCE_SIZE + 4]),
            Err(Error::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let ciphertext = encrypt(&key(42), b"").unwrap();
        let decrypted = decrypt(&key(42), &ciphertext).unwrap();

        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_large_plaintext() {
        let plaintext = vec![0xABu8; 1_000_000]; // 1 MB

        let ciphertext = encrypt(&key(42), &plaintext).unwrap();
        let decrypted = decrypt(&key(42), &ciphertext).unwrap();

        assert_eq!(decrypted.as_slice(), plaintext.as_slice());
    }

    proptest! {
        #[test]
        fn prop_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048), k in any::<u8>()) {
            let ciphertext = encrypt(&key(k), &data).unwrap();
            let decrypted = decrypt(&key(k), &ciphertext).unwrap();
            prop_assert_eq!(decrypted.as_slice(), data.as_slice());
        }

        #[test]
        fn prop_single_bit_flip_detected(
            data in proptest::collection::vec(any::<u8>(), 0..256),
            bit in any::<usize>(),
        ) {
            let mut ciphertext = encrypt(&key(7), &data).unwrap();
            let bit = bit % (ciphertext.len() * 8);
            ciphertext[bit / 8] ^= 1 << (bit % 8);

            prop_assert!(matches!(
                decrypt(&key(7), &ciphertext),
                Err(Error::AuthenticationFailed)
            ));
        }
    }
}
