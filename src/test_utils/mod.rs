//! Shared test utilities for skill.
//!
//! Public so integration tests under `tests/` can use them too.

pub mod fixtures;
pub mod transport;

pub use fixtures::RegistryFixture;
