pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod resolver;
pub mod storage;
pub mod test_utils;
pub mod vendor;

pub use error::{Result, SkillError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
