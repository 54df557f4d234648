//! Common utilities and types shared across the Idealista client crates.
//!
//! This module provides the error taxonomy and the data model (credentials,
//! token records, search parameters and results) used by the storage and
//! client layers.

pub mod error;
pub mod search;
pub mod types;

pub use error::{Error, Result};
pub use search::{keys, ParamValue, SearchParams, SearchResult};
pub use types::{Credentials, TokenRecord, EXPIRY_MARGIN_SECS};
