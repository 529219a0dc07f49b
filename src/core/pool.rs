//! Bounded worker pools for registry lookups and per-skill sync tasks.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Result, SkillError};

/// A dedicated rayon pool with `threads` workers (at least one).
pub fn worker_pool(threads: usize, label: &'static str) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(move |i| format!("skill-{label}-{i}"))
        .build()
        .map_err(|err| SkillError::Io(std::io::Error::other(format!("start {label} pool: {err}"))))
}
