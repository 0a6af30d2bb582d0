//! # Stratus
//!
//! Stratus is a conformance test harness for cloud control-plane APIs. It
//! drives a compute service and a volume/storage service over HTTP and
//! asserts observable behavior: status codes, resource state transitions,
//! and authorization boundaries.
//!
//! ## Architecture
//!
//! ```text
//! Harness → Credential Broker → Identity Service
//!    ↓             ↓
//! Client Set ← Credential Set
//!    ↓
//! Test bodies → Resource Tracker → Poller → teardown
//! ```
//!
//! ## Core Components
//!
//! - **Harness**: composes credentials, clients, tracking and polling into a
//!   setup/teardown lifecycle consumed by individual test cases
//! - **Credential Broker**: provisions isolated per-harness tenants or reads
//!   statically configured credentials
//! - **Resource Tracker**: records every ephemeral resource for guaranteed,
//!   best-effort teardown
//! - **Poller**: bounded wait-for-condition primitive for asynchronous state
//!   transitions
//! - **Client Facade**: thin typed reqwest wrappers over the per-service
//!   HTTP APIs

pub mod client;
pub mod config;
pub mod creds;
pub mod errors;
pub mod harness;
pub mod observability;
pub mod poll;
pub mod resources;
pub mod tracker;
pub mod utils;

// Re-export commonly used types
pub use errors::{Error, Result};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
