//! Filesystem abstraction for Hideaway.
//!
//! The vault core never touches `std::fs` directly. It goes through the
//! [`VaultFs`] trait so the same engine can run against the local disk or
//! an in-memory tree in tests.
//!
//! # Design Principles
//! - Blocking, synchronous calls: the core is single-threaded by contract
//! - Whole-buffer reads and writes: no streaming
//! - Replacing writes are atomic: readers never observe a half-written file

pub mod local;
pub mod memory;
pub mod provider;

pub use local::LocalFs;
pub use memory::MemoryFs;
pub use provider::{FileStat, VaultFs};
