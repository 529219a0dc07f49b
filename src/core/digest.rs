//! Content digests for artifacts and vendored trees.
//!
//! Every digest is `sha256:<64 lowercase hex>`. Registries are untrusted, so
//! digests coming from an index are parsed and validated here before they are
//! used as cache keys or compared against downloaded bytes.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{Result, SkillError};

const PREFIX: &str = "sha256:";
const HEX_LEN: usize = 64;

/// A validated SHA-256 content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Parse a digest string.
    ///
    /// Accepts `sha256:<hex>` or bare hex. Hex is normalized to lowercase.
    /// Anything that could escape a directory when used as a file name is
    /// rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SkillError::ValidationFailed("invalid digest: empty".to_string()));
        }
        if raw.contains('/') || raw.contains('\\') || raw.contains('\0') || raw.contains("..") {
            return Err(SkillError::ValidationFailed(
                "invalid digest: contains path separator or traversal sequence".to_string(),
            ));
        }

        let hex_part = match raw.split_once(':') {
            Some((algo, hex_part)) if algo.eq_ignore_ascii_case("sha256") => hex_part,
            Some((algo, _)) => {
                return Err(SkillError::ValidationFailed(format!(
                    "unsupported digest algorithm '{algo}', expected sha256"
                )));
            }
            None => raw,
        };
        if hex_part.len() != HEX_LEN || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SkillError::ValidationFailed(format!(
                "invalid digest: malformed hex component in '{}'",
                raw.chars().take(24).collect::<String>()
            )));
        }

        Ok(Self(format!("{PREFIX}{}", hex_part.to_ascii_lowercase())))
    }

    /// Digest of an in-memory buffer.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(bytes))
    }

    /// Digest of everything readable from `reader`, without buffering it.
    pub fn of_reader(mut reader: impl Read) -> io::Result<(Self, u64)> {
        let mut writer = DigestWriter::new(io::sink());
        let len = io::copy(&mut reader, &mut writer)?;
        let (_, digest, _) = writer.finish();
        Ok((digest, len))
    }

    fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("{PREFIX}{}", hex::encode(hasher.finalize())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex component, used as the cache file name.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.0[PREFIX.len()..]
    }

    /// First 12 hex characters, for human output.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.hex()[..12]
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentDigest {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = SkillError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentDigest> for String {
    fn from(value: ContentDigest) -> Self {
        value.0
    }
}

/// A writer that hashes every byte it forwards.
///
/// Downloads stream through this so the digest is known the moment the last
/// byte lands on disk.
pub struct DigestWriter<W> {
    inner: W,
    hasher: Sha256,
    written: u64,
}

impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            written: 0,
        }
    }

    /// Consume the writer, returning the inner writer, digest and byte count.
    pub fn finish(self) -> (W, ContentDigest, u64) {
        (self.inner, ContentDigest::from_hasher(self.hasher), self.written)
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Fail with [`SkillError::Integrity`] unless the digests match.
pub fn verify(name: &str, expected: &ContentDigest, actual: &ContentDigest) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    Err(SkillError::Integrity {
        name: name.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

/// Digest of a directory tree: for every file in path order, the relative
/// path, NUL, the content length as big-endian `u64`, then the contents.
/// Entries whose file name is in `exclude` are skipped.
pub fn hash_tree(root: &Path, exclude: &[&str]) -> Result<ContentDigest> {
    let mut hasher = Sha256::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            SkillError::Io(io::Error::other(format!("walk {}: {err}", root.display())))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if exclude
            .iter()
            .any(|name| entry.file_name() == std::ffi::OsStr::new(name))
        {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        hasher.update(rel.to_string_lossy().replace('\\', "/").as_bytes());
        hasher.update([0u8]);
        let mut file = std::fs::File::open(entry.path())?;
        hasher.update(file.metadata()?.len().to_be_bytes());
        io::copy(&mut file, &mut hasher)?;
    }
    Ok(ContentDigest::from_hasher(hasher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HELLO: &str = "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn of_bytes_matches_known_vector() {
        assert_eq!(ContentDigest::of_bytes(b"hello").as_str(), HELLO);
    }

    #[test]
    fn parse_normalizes_bare_and_uppercase_hex() {
        let bare = ContentDigest::parse(&HELLO[7..].to_uppercase()).unwrap();
        assert_eq!(bare.as_str(), HELLO);
        let prefixed = ContentDigest::parse(&format!("SHA256:{}", &HELLO[7..])).unwrap();
        assert_eq!(prefixed.as_str(), HELLO);
    }

    #[test]
    fn parse_rejects_malformed_digests() {
        assert!(ContentDigest::parse("").is_err());
        assert!(ContentDigest::parse("../../../etc/passwd").is_err());
        assert!(ContentDigest::parse("sha256:../abc").is_err());
        assert!(ContentDigest::parse("sha256:abc/def").is_err());
        assert!(ContentDigest::parse("sha256:abc\0def").is_err());
        assert!(ContentDigest::parse("md5:abcdef").is_err());
        assert!(ContentDigest::parse("sha256:abc").is_err());
        assert!(ContentDigest::parse(&format!("sha256:{}", "g".repeat(64))).is_err());
    }

    #[test]
    fn digest_writer_matches_one_shot_hash() {
        let mut writer = DigestWriter::new(Vec::new());
        writer.write_all(b"hel").unwrap();
        writer.write_all(b"lo").unwrap();
        let (inner, digest, len) = writer.finish();

        assert_eq!(inner, b"hello");
        assert_eq!(len, 5);
        assert_eq!(digest.as_str(), HELLO);
    }

    #[test]
    fn of_reader_streams() {
        let (digest, len) = ContentDigest::of_reader(&b"hello"[..]).unwrap();
        assert_eq!(digest.as_str(), HELLO);
        assert_eq!(len, 5);
    }

    #[test]
    fn verify_reports_both_digests() {
        let expected = ContentDigest::of_bytes(b"a");
        let actual = ContentDigest::of_bytes(b"b");
        assert!(verify("alpha", &expected, &expected).is_ok());

        let err = verify("alpha", &expected, &actual).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("alpha"));
        assert!(msg.contains(expected.as_str()));
        assert!(msg.contains(actual.as_str()));
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let ok: ContentDigest = serde_json::from_str(&format!("\"{HELLO}\"")).unwrap();
        assert_eq!(ok.as_str(), HELLO);
        assert!(serde_json::from_str::<ContentDigest>("\"sha256:nothex\"").is_err());
    }

    #[test]
    fn hash_tree_tells_apart_content_moved_across_files() {
        let first = tempdir().unwrap();
        std::fs::write(first.path().join("a"), "x").unwrap();
        std::fs::write(first.path().join("b"), "y").unwrap();

        let second = tempdir().unwrap();
        std::fs::write(second.path().join("a"), "xb\0y").unwrap();

        assert_ne!(hash_tree(first.path(), &[]).unwrap(), hash_tree(second.path(), &[]).unwrap());
    }

    #[test]
    fn hash_tree_ignores_excluded_files_and_tracks_content() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("refs")).unwrap();
        std::fs::write(dir.path().join("SKILL.md"), "body").unwrap();
        std::fs::write(dir.path().join("refs/a.md"), "a").unwrap();

        let before = hash_tree(dir.path(), &[".record"]).unwrap();
        std::fs::write(dir.path().join(".record"), "ignored").unwrap();
        assert_eq!(hash_tree(dir.path(), &[".record"]).unwrap(), before);

        std::fs::write(dir.path().join("refs/a.md"), "changed").unwrap();
        assert_ne!(hash_tree(dir.path(), &[".record"]).unwrap(), before);
    }
}
