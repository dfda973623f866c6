//! Vault engine for Hideaway.
//!
//! This module provides:
//! - Vault initialization, opening and reset
//! - The encrypted manifest of stored files
//! - Adding, retrieving and removing encrypted files
//! - Session handling with secure password management
//!
//! # Architecture
//! The vault module sits between the command-line front end and the
//! filesystem backend, handling all encryption/decryption transparently.
//! At most one process may manipulate a given vault at a time.

pub mod config;
pub mod layout;
pub mod manager;
pub mod manifest;
pub mod service;
pub mod session;

pub use config::VaultConfig;
pub use layout::VaultLayout;
pub use manager::VaultManager;
pub use manifest::{FileRecord, Manifest, ManifestStore};
pub use service::{AddFileRequest, FileVaultService, VaultStats};
pub use session::{SessionState, VaultSession};
