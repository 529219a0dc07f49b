//! Project workflows.
//!
//! Each public function here is one user-facing operation. They own the
//! ordering between the resolver, the documents, the cache and the vendor
//! directory; the CLI only parses arguments and prints results.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::{RetryConfig, VersionConstraint};
use crate::error::{Result, SkillError};
use crate::fetch::{ArtifactCache, PruneReport, Transport, VerifyReport};
use crate::registry::RegistryClient;
use crate::resolver::{self, ResolveOptions};
use crate::storage::{
    AddOutcome, LockStatus, Lockfile, Manifest, ProjectLock, Requirement, LOCKFILE_FILE,
    MANIFEST_FILE,
};
use crate::vendor::{scan_vendor_dir, SyncOptions, SyncReport, VendorSynchronizer};

/// Per-project state directory (config overrides, run lock).
pub const STATE_DIR: &str = ".skill";

/// Paths that make up one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub lockfile_path: PathBuf,
    pub vendor_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl Project {
    /// A project rooted at `root`. A relative `vendor_dir` is taken
    /// relative to the root.
    pub fn new(root: impl Into<PathBuf>, vendor_dir: &Path) -> Self {
        let root = root.into();
        Self {
            manifest_path: root.join(MANIFEST_FILE),
            lockfile_path: root.join(LOCKFILE_FILE),
            vendor_dir: root.join(vendor_dir),
            state_dir: root.join(STATE_DIR),
            root,
        }
    }

    /// Nearest directory at or above `start` that contains `skill.toml`.
    #[must_use]
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(MANIFEST_FILE).is_file())
            .map(Path::to_path_buf)
    }

    pub fn load_manifest(&self) -> Result<Manifest> {
        if !self.manifest_path.exists() {
            return Err(SkillError::Config(format!(
                "{} not found; run `skill init` first",
                self.manifest_path.display()
            )));
        }
        Manifest::load(&self.manifest_path)
    }

    fn acquire(&self) -> Result<ProjectLock> {
        ProjectLock::acquire(&self.state_dir)
    }
}

// =============================================================================
// MANIFEST EDITS
// =============================================================================

/// Create an empty manifest and the state directory. Returns false when a
/// manifest already exists.
pub fn init(project: &Project) -> Result<bool> {
    fs::create_dir_all(&project.state_dir)?;
    let gitignore = project.state_dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, "run.lock\n")?;
    }
    if project.manifest_path.exists() {
        return Ok(false);
    }
    let _lock = project.acquire()?;
    Manifest::new().save(&project.manifest_path)?;
    info!(path = %project.manifest_path.display(), "created manifest");
    Ok(true)
}

pub fn add(project: &Project, name: &str, constraint: VersionConstraint) -> Result<AddOutcome> {
    let _lock = project.acquire()?;
    let mut manifest = project.load_manifest()?;
    let outcome = manifest.add(name, constraint)?;
    if outcome != AddOutcome::Unchanged {
        manifest.save(&project.manifest_path)?;
    }
    Ok(outcome)
}

pub fn remove(project: &Project, name: &str) -> Result<Vec<Requirement>> {
    let _lock = project.acquire()?;
    let mut manifest = project.load_manifest()?;
    let removed = manifest.remove(name)?;
    manifest.save(&project.manifest_path)?;
    Ok(removed)
}

// =============================================================================
// LOCK
// =============================================================================

#[derive(Debug, Clone)]
pub struct LockOutcome {
    pub lockfile: Lockfile,
    /// False when the file already held exactly this resolution.
    pub written: bool,
}

/// Resolve the manifest from scratch and write `skill.lock`.
///
/// Nothing is written unless every skill resolves.
pub fn lock(
    project: &Project,
    registry: &dyn RegistryClient,
    options: &ResolveOptions,
) -> Result<LockOutcome> {
    let _lock = project.acquire()?;
    let manifest = project.load_manifest()?;
    let lockfile = resolver::resolve(&manifest, registry, options)?.into_lockfile(&manifest)?;
    let written = lockfile.save_if_changed(&project.lockfile_path)?;
    info!(skills = lockfile.entries().len(), written, "lockfile ready");
    Ok(LockOutcome { lockfile, written })
}

// =============================================================================
// INSTALL
// =============================================================================

#[derive(Clone, Default)]
pub struct InstallOptions {
    /// Refuse to resolve; install exactly what `skill.lock` says.
    pub frozen: bool,
    pub resolve: ResolveOptions,
    pub sync: SyncOptions,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    pub lockfile_written: bool,
    pub report: SyncReport,
}

/// Make the vendor directory match the manifest.
///
/// A missing lockfile is resolved first (which needs a registry), and a
/// stale one has only its stale skills re-resolved, unless `frozen` is set,
/// in which case either is an error. Locked versions that still satisfy an
/// edited manifest are kept.
pub fn install(
    project: &Project,
    registry: Option<&dyn RegistryClient>,
    cache: &ArtifactCache,
    transport: &dyn Transport,
    options: &InstallOptions,
) -> Result<InstallOutcome> {
    let _lock = project.acquire()?;
    let manifest = project.load_manifest()?;
    let existing = Lockfile::load_optional(&project.lockfile_path)?;
    let status = existing.as_ref().map(|l| l.check_against(&manifest));

    let (lockfile, lockfile_written) = match (existing, status) {
        (Some(lockfile), Some(LockStatus::Current)) => (lockfile, false),
        (Some(lockfile), Some(LockStatus::Satisfied)) if options.frozen => (lockfile, false),
        (Some(lockfile), Some(LockStatus::Satisfied)) => {
            let lockfile = lockfile.with_manifest_digest(manifest.requirements_digest());
            let written = lockfile.save_if_changed(&project.lockfile_path)?;
            (lockfile, written)
        }
        (previous, status) => {
            if options.frozen {
                return Err(SkillError::LockfileOutdated(match status {
                    Some(LockStatus::Stale(names)) => {
                        format!("{LOCKFILE_FILE} is out of date for: {}", names.join(", "))
                    }
                    _ => format!("{LOCKFILE_FILE} is missing"),
                }));
            }
            let registry =
                registry.ok_or_else(|| SkillError::MissingConfig("registry.sources".to_string()))?;
            let resolution = match &previous {
                Some(previous) => {
                    info!("lockfile stale, resolving changed skills");
                    resolver::resolve_stale(&manifest, registry, &options.resolve, previous)?
                }
                None => {
                    info!("lockfile missing, resolving");
                    resolver::resolve(&manifest, registry, &options.resolve)?
                }
            };
            let lockfile = resolution.into_lockfile(&manifest)?;
            let written = lockfile.save_if_changed(&project.lockfile_path)?;
            (lockfile, written)
        }
    };

    let report = VendorSynchronizer::new(&project.vendor_dir, cache, transport)
        .with_retry(options.retry.clone())
        .with_concurrency(options.resolve.concurrency)
        .sync(&lockfile, &options.sync)?;

    Ok(InstallOutcome {
        lockfile_written,
        report,
    })
}

// =============================================================================
// STATUS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillState {
    /// Installed tree matches the lockfile.
    Installed,
    /// Locked but not installed.
    Missing,
    /// Installed from a different artifact than the lockfile names, or
    /// nothing is locked yet.
    Outdated,
    /// Installed files were edited after install.
    Modified,
    /// Installed but no longer in the lockfile.
    Extraneous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillStatus {
    pub name: String,
    pub state: SkillState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<String>,
    /// Whether the locked artifact is in the cache.
    pub cached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockfileState {
    Missing,
    Current,
    Satisfied,
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub tool_version: String,
    pub lockfile: LockfileState,
    /// Skills that make the lockfile stale.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stale: Vec<String>,
    pub skills: Vec<SkillStatus>,
}

impl StatusReport {
    /// True when nothing needs `skill install`.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self.lockfile, LockfileState::Current | LockfileState::Satisfied)
            && self.skills.iter().all(|s| s.state == SkillState::Installed)
    }
}

/// Compare manifest, lockfile and vendor directory without changing any
/// of them.
pub fn status(project: &Project, cache: &ArtifactCache) -> Result<StatusReport> {
    let manifest = project.load_manifest()?;
    let lockfile = Lockfile::load_optional(&project.lockfile_path)?;
    let scan = scan_vendor_dir(&project.vendor_dir)?;

    let (lockfile_state, stale) = match lockfile.as_ref().map(|l| l.check_against(&manifest)) {
        None => (LockfileState::Missing, Vec::new()),
        Some(LockStatus::Current) => (LockfileState::Current, Vec::new()),
        Some(LockStatus::Satisfied) => (LockfileState::Satisfied, Vec::new()),
        Some(LockStatus::Stale(names)) => (LockfileState::Stale, names),
    };

    let entries = lockfile.as_ref().map_or(&[][..], Lockfile::entries);
    let mut names: BTreeSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    names.extend(scan.records.keys().map(String::as_str));
    if lockfile.is_none() {
        names.extend(manifest.requirements().iter().map(|r| r.name.as_str()));
    }

    let mut skills = Vec::with_capacity(names.len());
    for name in names {
        let locked = entries.iter().find(|e| e.name == name);
        let record = scan.records.get(name);
        let state = match (locked, record) {
            (_, None) => SkillState::Missing,
            (None, Some(_)) if lockfile.is_none() => SkillState::Outdated,
            (None, Some(_)) => SkillState::Extraneous,
            (Some(entry), Some(record)) if record.digest != entry.digest => SkillState::Outdated,
            (Some(_), Some(record)) => {
                if record.tree_intact(&project.vendor_dir.join(name))? {
                    SkillState::Installed
                } else {
                    SkillState::Modified
                }
            }
        };
        skills.push(SkillStatus {
            name: name.to_string(),
            state,
            locked: locked.map(|e| e.version.to_string()),
            installed: record.map(|r| r.version.to_string()),
            cached: locked.is_some_and(|e| cache.contains(&e.digest)),
        });
    }

    Ok(StatusReport {
        tool_version: crate::VERSION.to_string(),
        lockfile: lockfile_state,
        stale,
        skills,
    })
}

// =============================================================================
// CACHE MAINTENANCE
// =============================================================================

/// Remove cache entries the project's lockfile does not reference.
pub fn cache_prune(project: &Project, cache: &ArtifactCache) -> Result<PruneReport> {
    let lockfile = Lockfile::load_optional(&project.lockfile_path)?.ok_or_else(|| {
        SkillError::LockfileOutdated(format!(
            "{LOCKFILE_FILE} is missing; prune keeps only locked artifacts, run `skill lock` first"
        ))
    })?;
    let keep = lockfile.entries().iter().map(|e| e.digest.clone()).collect();
    cache.prune(&keep)
}

/// Re-hash every cache entry, evicting corrupted ones.
pub fn cache_verify(cache: &ArtifactCache) -> Result<VerifyReport> {
    cache.verify_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ContentDigest;
    use crate::registry::{ArtifactKind, MemoryRegistry};
    use crate::test_utils::transport::{CountingTransport, StaticTransport};
    use tempfile::{tempdir, TempDir};

    struct Env {
        _dir: TempDir,
        project: Project,
        registry: MemoryRegistry,
        transport: CountingTransport<StaticTransport>,
        cache: ArtifactCache,
    }

    impl Env {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let project = Project::new(dir.path().join("app"), Path::new("skills"));
            fs::create_dir_all(&project.root).unwrap();
            init(&project).unwrap();
            let cache = ArtifactCache::open(dir.path().join("cache")).unwrap();
            Self {
                _dir: dir,
                project,
                registry: MemoryRegistry::new("mem"),
                transport: CountingTransport::new(StaticTransport::new()),
                cache,
            }
        }

        fn publish(&self, name: &str, version: &str) {
            let url = format!("mem://{name}/{version}");
            let body = format!("# {name} {version}");
            self.transport.inner().insert(&url, body.as_bytes());
            self.registry
                .publish(name, version, &url, ContentDigest::of_bytes(body.as_bytes()), ArtifactKind::Markdown)
                .unwrap();
        }

        fn add(&self, name: &str, constraint: &str) {
            add(&self.project, name, VersionConstraint::parse(constraint).unwrap()).unwrap();
        }

        fn install(&self, options: &InstallOptions) -> Result<InstallOutcome> {
            install(
                &self.project,
                Some(&self.registry),
                &self.cache,
                &self.transport,
                options,
            )
        }

        fn state_of(&self, name: &str) -> SkillState {
            status(&self.project, &self.cache)
                .unwrap()
                .skills
                .into_iter()
                .find(|s| s.name == name)
                .map(|s| s.state)
                .unwrap()
        }
    }

    fn frozen() -> InstallOptions {
        InstallOptions {
            frozen: true,
            ..InstallOptions::default()
        }
    }

    #[test]
    fn init_is_idempotent() {
        let env = Env::new();
        assert!(!init(&env.project).unwrap());
        assert!(env.project.state_dir.join(".gitignore").exists());
        assert!(env.project.load_manifest().unwrap().is_empty());
    }

    #[test]
    fn lock_picks_highest_compatible_version() {
        let env = Env::new();
        for v in ["1.0.0", "1.2.0", "2.0.0"] {
            env.publish("alpha", v);
        }
        env.add("alpha", "^1.0.0");

        let outcome = lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap();
        assert!(outcome.written);
        assert_eq!(outcome.lockfile.get("alpha").unwrap().version.to_string(), "1.2.0");

        let again = lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap();
        assert!(!again.written);
    }

    #[test]
    fn conflicting_manifest_writes_no_lockfile() {
        let env = Env::new();
        env.publish("alpha", "1.0.0");
        env.publish("alpha", "2.0.0");
        fs::write(
            &env.project.manifest_path,
            "version = 1\n[[skill]]\nname = \"alpha\"\nversion = \"1.0.0\"\n[[skill]]\nname = \"alpha\"\nversion = \"2.0.0\"\n",
        )
        .unwrap();

        let err = lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, SkillError::Conflict { .. }));
        assert!(!env.project.lockfile_path.exists());
    }

    #[test]
    fn install_resolves_then_syncs() {
        let env = Env::new();
        env.publish("alpha", "1.0.0");
        env.publish("beta", "1.0.0");
        env.add("alpha", "latest");
        env.add("beta", "^1");

        let outcome = env.install(&InstallOptions::default()).unwrap();
        assert!(outcome.lockfile_written);
        assert_eq!(outcome.report.installed.len(), 2);
        assert!(env.project.vendor_dir.join("beta/SKILL.md").exists());
        assert!(status(&env.project, &env.cache).unwrap().is_clean());
    }

    #[test]
    fn frozen_install_refuses_missing_or_stale_lockfile() {
        let env = Env::new();
        env.publish("alpha", "1.0.0");
        env.publish("alpha", "2.0.0");
        env.add("alpha", "^1");

        assert!(matches!(env.install(&frozen()), Err(SkillError::LockfileOutdated(_))));

        lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap();
        env.add("alpha", "^2");
        let err = env.install(&frozen()).unwrap_err();
        assert!(matches!(err, SkillError::LockfileOutdated(msg) if msg.contains("alpha")));
        assert!(!env.project.vendor_dir.join("alpha").exists());
    }

    #[test]
    fn frozen_install_needs_no_registry() {
        let env = Env::new();
        env.publish("alpha", "1.0.0");
        env.add("alpha", "latest");
        lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap();

        let outcome = install(&env.project, None, &env.cache, &env.transport, &frozen()).unwrap();
        assert_eq!(outcome.report.installed.len(), 1);
        assert!(!outcome.lockfile_written);
    }

    #[test]
    fn satisfied_lockfile_keeps_versions() {
        let env = Env::new();
        env.publish("alpha", "1.0.0");
        env.add("alpha", "^1");
        lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap();

        env.publish("alpha", "1.5.0");
        env.add("alpha", ">=1.0.0");
        let outcome = env.install(&InstallOptions::default()).unwrap();
        assert!(outcome.lockfile_written);
        assert_eq!(outcome.report.installed[0].version, "1.0.0");
        assert_eq!(
            Lockfile::load(&env.project.lockfile_path).unwrap().check_against(&env.project.load_manifest().unwrap()),
            LockStatus::Current
        );
    }

    #[test]
    fn stale_lockfile_keeps_versions_of_untouched_skills() {
        let env = Env::new();
        env.publish("alpha", "1.0.0");
        env.add("alpha", "^1");
        env.install(&InstallOptions::default()).unwrap();

        env.publish("alpha", "1.1.0");
        env.publish("gamma", "0.3.0");
        env.add("gamma", "latest");
        let outcome = env.install(&InstallOptions::default()).unwrap();

        let lockfile = Lockfile::load(&env.project.lockfile_path).unwrap();
        assert_eq!(lockfile.get("alpha").unwrap().version.to_string(), "1.0.0");
        assert_eq!(lockfile.get("gamma").unwrap().version.to_string(), "0.3.0");
        assert!(outcome.report.updated.is_empty());
        assert_eq!(outcome.report.unchanged[0].name, "alpha");
        assert_eq!(outcome.report.installed[0].name, "gamma");
    }

    #[test]
    fn removing_from_manifest_removes_from_vendor() {
        let env = Env::new();
        env.publish("beta", "1.0.0");
        env.publish("gamma", "1.0.0");
        env.add("beta", "latest");
        env.add("gamma", "latest");
        env.install(&InstallOptions::default()).unwrap();

        let calls = env.transport.calls();
        remove(&env.project, "gamma").unwrap();
        let report = env.install(&InstallOptions::default()).unwrap().report;

        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].name, "gamma");
        assert_eq!(report.unchanged[0].name, "beta");
        assert!(!env.project.vendor_dir.join("gamma").exists());
        assert_eq!(env.transport.calls(), calls);
    }

    #[test]
    fn status_reports_each_state() {
        let env = Env::new();
        env.publish("alpha", "1.0.0");
        env.publish("beta", "1.0.0");
        env.publish("gamma", "1.0.0");
        env.add("alpha", "latest");
        env.add("beta", "latest");
        env.add("gamma", "latest");
        env.install(&InstallOptions::default()).unwrap();

        fs::write(env.project.vendor_dir.join("alpha/SKILL.md"), "edited").unwrap();
        fs::remove_dir_all(env.project.vendor_dir.join("beta")).unwrap();
        remove(&env.project, "gamma").unwrap();
        lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap();

        assert_eq!(env.state_of("alpha"), SkillState::Modified);
        assert_eq!(env.state_of("beta"), SkillState::Missing);
        assert_eq!(env.state_of("gamma"), SkillState::Extraneous);

        env.publish("alpha", "1.1.0");
        lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap();
        assert_eq!(env.state_of("alpha"), SkillState::Outdated);
    }

    #[test]
    fn add_and_remove_edit_the_manifest() {
        let env = Env::new();
        env.add("alpha", "^1");
        let outcome = add(&env.project, "alpha", VersionConstraint::parse("^2").unwrap()).unwrap();
        assert!(matches!(outcome, AddOutcome::Replaced(_)));

        assert_eq!(remove(&env.project, "alpha").unwrap().len(), 1);
        assert!(matches!(remove(&env.project, "alpha"), Err(SkillError::NotInManifest(_))));
    }

    #[test]
    fn prune_needs_a_lockfile_and_keeps_locked_artifacts() {
        let env = Env::new();
        assert!(matches!(
            cache_prune(&env.project, &env.cache),
            Err(SkillError::LockfileOutdated(_))
        ));

        env.publish("alpha", "1.0.0");
        env.publish("beta", "1.0.0");
        env.add("alpha", "latest");
        env.add("beta", "latest");
        env.install(&InstallOptions::default()).unwrap();
        remove(&env.project, "beta").unwrap();
        lock(&env.project, &env.registry, &ResolveOptions::default()).unwrap();

        let report = cache_prune(&env.project, &env.cache).unwrap();
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.kept, 1);
        assert_eq!(cache_verify(&env.cache).unwrap().checked, 1);
    }

    #[test]
    fn discover_walks_up_to_the_manifest() {
        let env = Env::new();
        let nested = env.project.root.join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(Project::discover(&nested), Some(env.project.root.clone()));
    }
}
