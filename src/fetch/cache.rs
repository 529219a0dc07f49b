//! Content-addressed artifact cache.
//!
//! ```text
//! <cache>/artifacts/sha256/<hex>   verified artifact, never modified
//! <cache>/tmp/                     in-flight downloads
//! ```
//!
//! An entry only appears through an atomic rename after its bytes hashed to
//! the expected digest, so any file under `artifacts/` was complete and
//! correct when written. Several projects and concurrent runs may share one
//! cache: two runs fetching the same digest both rename identical bytes
//! into place.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{is_permanent, Transport};
use crate::core::digest::{self, ContentDigest, DigestWriter};
use crate::core::recovery::{with_retry_if, RetryConfig};
use crate::error::{Result, SkillError};
use crate::registry::ResolvedArtifact;

const ARTIFACTS_DIR: &str = "artifacts/sha256";
const TMP_DIR: &str = "tmp";
const STALE_TEMP_AGE: Duration = Duration::from_secs(24 * 60 * 60);
const COPY_BUF: usize = 64 * 1024;

/// A verified artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub digest: ContentDigest,
    pub path: PathBuf,
    pub size: u64,
    /// False when the entry was already present.
    pub downloaded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub removed: Vec<ContentDigest>,
    pub kept: usize,
    pub freed_bytes: u64,
    pub stale_temp_files: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub checked: usize,
    /// Entries whose content no longer matched their name. They were removed.
    pub corrupted: Vec<ContentDigest>,
}

enum AttemptError {
    /// The transport failed; another attempt may succeed.
    Transport(io::Error),
    /// Anything else, including a digest mismatch. Never retried.
    Fatal(SkillError),
}

#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    /// Open (creating if needed) the cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(ARTIFACTS_DIR))?;
        fs::create_dir_all(root.join(TMP_DIR))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, digest: &ContentDigest) -> PathBuf {
        self.root.join(ARTIFACTS_DIR).join(digest.hex())
    }

    #[must_use]
    pub fn contains(&self, digest: &ContentDigest) -> bool {
        self.path_for(digest).is_file()
    }

    /// Make sure the artifact is cached, downloading it if needed.
    ///
    /// A hit never touches the transport. A download whose digest does not
    /// match fails with [`SkillError::Integrity`] and leaves nothing behind.
    /// Transport failures are retried per `retry`, then reported as
    /// [`SkillError::Fetch`].
    pub fn ensure_cached(
        &self,
        artifact: &ResolvedArtifact,
        transport: &dyn Transport,
        retry: &RetryConfig,
    ) -> Result<CacheEntry> {
        let path = self.path_for(&artifact.digest);
        if let Ok(meta) = fs::metadata(&path) {
            debug!(skill = %artifact.name, digest = artifact.digest.short(), "cache hit");
            return Ok(CacheEntry {
                digest: artifact.digest.clone(),
                path,
                size: meta.len(),
                downloaded: false,
            });
        }

        let result = with_retry_if(
            retry,
            |_| self.download_once(artifact, transport, &path),
            |err| matches!(err, AttemptError::Transport(io_err) if !is_permanent(io_err)),
        );

        match result {
            Ok(size) => {
                info!(
                    skill = %artifact.name,
                    version = %artifact.version,
                    digest = artifact.digest.short(),
                    size,
                    "downloaded artifact"
                );
                Ok(CacheEntry {
                    digest: artifact.digest.clone(),
                    path,
                    size,
                    downloaded: true,
                })
            }
            Err(AttemptError::Transport(err)) => Err(SkillError::Fetch {
                name: artifact.name.clone(),
                url: artifact.url.clone(),
                reason: err.to_string(),
            }),
            Err(AttemptError::Fatal(err)) => Err(err),
        }
    }

    fn download_once(
        &self,
        artifact: &ResolvedArtifact,
        transport: &dyn Transport,
        dest: &Path,
    ) -> std::result::Result<u64, AttemptError> {
        let fatal = |err: io::Error| AttemptError::Fatal(SkillError::Io(err));

        let mut reader = transport.open(&artifact.url).map_err(AttemptError::Transport)?;
        let temp = NamedTempFile::new_in(self.root.join(TMP_DIR)).map_err(fatal)?;
        let mut writer = DigestWriter::new(temp);

        let mut buf = vec![0u8; COPY_BUF];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(AttemptError::Transport(err)),
            };
            writer.write_all(&buf[..n]).map_err(fatal)?;
        }
        writer.flush().map_err(fatal)?;

        let (temp, actual, size) = writer.finish();
        digest::verify(&artifact.name, &artifact.digest, &actual).map_err(AttemptError::Fatal)?;
        temp.as_file().sync_all().map_err(fatal)?;

        if let Err(err) = temp.persist(dest) {
            // Another run may have committed the same bytes first.
            if !dest.is_file() {
                return Err(fatal(err.error));
            }
        }
        Ok(size)
    }

    /// Read a cached artifact, re-hashing it on the way.
    ///
    /// An entry whose content no longer matches its digest is evicted and
    /// reported as [`SkillError::Integrity`].
    pub fn read_verified(&self, name: &str, digest: &ContentDigest) -> Result<Vec<u8>> {
        let path = self.path_for(digest);
        let bytes = fs::read(&path)?;
        let actual = ContentDigest::of_bytes(&bytes);
        if let Err(err) = digest::verify(name, digest, &actual) {
            warn!(skill = name, digest = digest.short(), "evicting corrupted cache entry");
            if let Err(remove_err) = fs::remove_file(&path) {
                debug!("failed to evict {}: {remove_err}", path.display());
            }
            return Err(err);
        }
        Ok(bytes)
    }

    /// Digests and sizes of every entry.
    pub fn entries(&self) -> Result<Vec<(ContentDigest, u64)>> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(self.root.join(ARTIFACTS_DIR))? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let Some(digest) = name.to_str().and_then(|n| ContentDigest::parse(n).ok()) else {
                debug!(file = ?name, "ignoring foreign file in cache");
                continue;
            };
            entries.push((digest, dir_entry.metadata()?.len()));
        }
        entries.sort();
        Ok(entries)
    }

    /// Remove every entry whose digest is not in `keep`, plus abandoned
    /// temporary files.
    pub fn prune(&self, keep: &BTreeSet<ContentDigest>) -> Result<PruneReport> {
        let mut report = PruneReport::default();
        for (digest, size) in self.entries()? {
            if keep.contains(&digest) {
                report.kept += 1;
                continue;
            }
            match fs::remove_file(self.path_for(&digest)) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            }
            report.freed_bytes += size;
            report.removed.push(digest);
        }

        let now = SystemTime::now();
        for dir_entry in fs::read_dir(self.root.join(TMP_DIR))? {
            let dir_entry = dir_entry?;
            let age = dir_entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if age.is_some_and(|age| age >= STALE_TEMP_AGE) && fs::remove_file(dir_entry.path()).is_ok() {
                report.stale_temp_files += 1;
            }
        }

        info!(
            removed = report.removed.len(),
            kept = report.kept,
            freed_bytes = report.freed_bytes,
            "pruned cache"
        );
        Ok(report)
    }

    /// Re-hash every entry, evicting the ones that no longer match.
    pub fn verify_all(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();
        for (digest, _) in self.entries()? {
            report.checked += 1;
            let path = self.path_for(&digest);
            let (actual, _) = ContentDigest::of_reader(fs::File::open(&path)?)?;
            if actual != digest {
                warn!(digest = digest.short(), "evicting corrupted cache entry");
                fs::remove_file(&path)?;
                report.corrupted.push(digest);
            }
        }
        Ok(report)
    }
}
