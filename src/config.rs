use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillError};

/// Effective configuration: defaults, then the global file, then the project
/// file (or a single explicit file), then `SKILL_*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub vendor: VendorConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, state_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILL_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            match Self::load_patch(&path)? {
                Some(patch) => config.merge_patch(patch.anchored(parent_dir(&path))),
                None => {
                    return Err(SkillError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(state_dir)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir().map(|dir| dir.join("skill")) else {
            return Ok(None);
        };
        Ok(Self::load_patch(&dir.join("config.toml"))?.map(|patch| patch.anchored(&dir)))
    }

    /// Relative paths in the project file are taken from the project root,
    /// the parent of the state directory.
    fn load_project(state_dir: &Path) -> Result<Option<ConfigPatch>> {
        let root = parent_dir(state_dir);
        Ok(Self::load_patch(&state_dir.join("config.toml"))?.map(|patch| patch.anchored(root)))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SkillError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SkillError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.registry {
            self.registry.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
        if let Some(patch) = patch.fetch {
            self.fetch.merge(patch);
        }
        if let Some(patch) = patch.vendor {
            self.vendor.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(values) = env_list("SKILL_REGISTRY") {
            self.registry.sources = merge_unique(values, &self.registry.sources);
        }
        if let Some(value) = env_string("SKILL_CACHE_DIR") {
            self.cache.dir = Some(PathBuf::from(value));
        }
        if let Some(value) = env_u32("SKILL_FETCH_CONCURRENCY")? {
            self.fetch.concurrency = value as usize;
        }
        if let Some(value) = env_u32("SKILL_FETCH_MAX_ATTEMPTS")? {
            self.fetch.max_attempts = value;
        }
        if let Some(value) = env_u64("SKILL_FETCH_TIMEOUT_SECS")? {
            self.fetch.timeout = Duration::from_secs(value);
        }
        if let Some(value) = env_string("SKILL_VENDOR_DIR") {
            self.vendor.dir = PathBuf::from(value);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(SkillError::Config(
                "fetch.concurrency must be at least 1".to_string(),
            ));
        }
        if self.fetch.max_attempts == 0 {
            return Err(SkillError::Config(
                "fetch.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.vendor.dir.as_os_str().is_empty() {
            return Err(SkillError::Config("vendor.dir must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registries in lookup order. `http(s)://` URLs, `file://` URLs or
    /// plain directory paths.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl RegistryConfig {
    fn merge(&mut self, patch: RegistryPatch) {
        if let Some(values) = patch.sources {
            self.sources = values;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Defaults to the platform cache directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.dir {
            self.dir = Some(value);
        }
    }

    /// Configured cache directory, or `<platform cache dir>/skill`, or
    /// `fallback` when the platform has none.
    #[must_use]
    pub fn resolve_dir(&self, fallback: &Path) -> PathBuf {
        self.dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("skill")))
            .unwrap_or_else(|| fallback.to_path_buf())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Parallel registry lookups and per-skill sync tasks.
    pub concurrency: usize,
    /// Download attempts per artifact, including the first.
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_attempts: 3,
            backoff: Duration::from_millis(200),
            timeout: Duration::from_secs(30),
        }
    }
}

impl FetchConfig {
    fn merge(&mut self, patch: FetchPatch) {
        if let Some(value) = patch.concurrency {
            self.concurrency = value;
        }
        if let Some(value) = patch.max_attempts {
            self.max_attempts = value;
        }
        if let Some(value) = patch.backoff {
            self.backoff = value;
        }
        if let Some(value) = patch.timeout {
            self.timeout = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Vendor directory, relative to the project root unless absolute.
    pub dir: PathBuf,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("skills"),
        }
    }
}

impl VendorConfig {
    fn merge(&mut self, patch: VendorPatch) {
        if let Some(value) = patch.dir {
            self.dir = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub registry: Option<RegistryPatch>,
    pub cache: Option<CachePatch>,
    pub fetch: Option<FetchPatch>,
    pub vendor: Option<VendorPatch>,
}

impl ConfigPatch {
    /// Make relative registry paths and the cache directory relative to
    /// `base` instead of the working directory.
    fn anchored(mut self, base: &Path) -> Self {
        if let Some(sources) = self.registry.as_mut().and_then(|r| r.sources.as_mut()) {
            for source in sources.iter_mut() {
                if !source.contains("://") && Path::new(source.as_str()).is_relative() {
                    *source = base.join(source.as_str()).to_string_lossy().into_owned();
                }
            }
        }
        if let Some(dir) = self.cache.as_mut().and_then(|c| c.dir.as_mut()) {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RegistryPatch {
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachePatch {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FetchPatch {
    pub concurrency: Option<usize>,
    pub max_attempts: Option<u32>,
    #[serde(default, with = "humantime_serde")]
    pub backoff: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct VendorPatch {
    pub dir: Option<PathBuf>,
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match env_string(key) {
        Some(value) => value.trim().parse::<u32>().map(Some).map_err(|err| {
            SkillError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        None => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match env_string(key) {
        Some(value) => value.trim().parse::<u64>().map(Some).map_err(|err| {
            SkillError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        None => Ok(None),
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    env_string(key).map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}
