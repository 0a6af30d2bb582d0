//! # Configuration Management
//!
//! Read-only settings for the harness: identity credentials, per-service
//! endpoints and wait tuning, and service availability flags. Values come
//! from an optional TOML file merged with `STRATUS_*` environment variables.

mod settings;

pub use settings::{
    AdminCredentials, ComputeConfig, IdentityConfig, ServiceAvailability, TestConfig, VolumeConfig,
    WireFormat,
};
