//! Core building blocks shared by the resolver, cache and synchronizer.

pub mod cancel;
pub mod digest;
pub mod name;
pub mod pool;
pub mod recovery;
pub mod version;

pub use cancel::CancellationToken;
pub use digest::{ContentDigest, DigestWriter};
pub use name::validate_skill_name;
pub use pool::worker_pool;
pub use recovery::RetryConfig;
pub use version::VersionConstraint;
