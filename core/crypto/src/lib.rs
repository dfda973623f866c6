//! Cryptographic primitives for Hideaway.
//!
//! This module provides:
//! - Encryption key derivation using PBKDF2-HMAC-SHA256
//! - Login hash derivation using Argon2id
//! - Authenticated encryption using AES-256-GCM
//! - Key and salt types with automatic zeroization
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Login hashes are compared in constant time

pub mod aead;
pub mod kdf;
pub mod keys;

pub use aead::{decrypt, encrypt, NONCE_SIZE, TAG_SIZE};
pub use kdf::{derive_encryption_key, derive_login_hash, verify_login_hash, LoginHashParams};
pub use keys::{EncryptionKey, LoginHash, Salt, DEFAULT_SALT_LENGTH, KEY_LENGTH, MIN_SALT_LENGTH};
