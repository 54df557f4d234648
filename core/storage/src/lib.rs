//! Persistence layer for the Idealista client.
//!
//! This module provides a trait-based interface for the two small JSON
//! documents the client keeps on disk (credentials config and token cache),
//! a filesystem implementation, an in-memory implementation for tests, and
//! the directory provider that decides where the files live.
//!
//! # Design Principles
//! - Injected storage: callers depend on `StateStore`, never on paths
//! - Missing files read as empty documents; malformed files are errors
//! - No cross-process locking; the last writer wins

pub mod config;
pub mod local;
pub mod memory;
pub mod paths;
pub mod provider;
pub mod token_cache;

pub use config::{ConfigStore, StoredCredentials};
pub use local::FileStore;
pub use memory::MemoryStore;
pub use paths::StateDirs;
pub use provider::{JsonObject, StateStore};
pub use token_cache::TokenCache;
