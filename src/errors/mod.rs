//! # Error Handling
//!
//! Error types shared across the harness, clients and pollers, built on
//! `thiserror`. Authorization failures and missing resources surface as
//! distinct variants rather than raw status codes so negative tests can
//! assert on them directly.

mod types;

pub use types::{Error, Result};
