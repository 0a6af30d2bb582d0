//! Shared helpers.

mod naming;

pub use naming::rand_name;
