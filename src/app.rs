//! Per-invocation context shared by every command.

use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::core::{CancellationToken, RetryConfig};
use crate::engine::{Project, STATE_DIR};
use crate::error::Result;
use crate::fetch::{ArtifactCache, DefaultTransport};
use crate::registry::SourceList;
use crate::resolver::ResolveOptions;

pub struct AppContext {
    pub project: Project,
    pub config: Config,
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub cancel: CancellationToken,
}

impl AppContext {
    /// Locate the project and load its configuration.
    ///
    /// The project root is `-C`/`SKILL_PROJECT` if given, else the nearest
    /// directory above the working directory holding `skill.toml`, else the
    /// working directory itself.
    pub fn from_cli(cli: &Cli, cancel: CancellationToken) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let root = match &cli.project {
            Some(dir) => std::path::absolute(dir)?,
            None => Project::discover(&cwd).unwrap_or(cwd),
        };

        let config = Config::load(cli.config.as_deref(), &root.join(STATE_DIR))?;
        let project = Project::new(root, &config.vendor.dir);

        Ok(Self {
            project,
            config,
            output_format: cli.output_format(),
            quiet: cli.quiet,
            cancel,
        })
    }

    #[must_use]
    pub fn robot_mode(&self) -> bool {
        self.output_format.is_machine_readable()
    }

    /// The configured registries. Fails when none are configured.
    pub fn registry(&self) -> Result<SourceList> {
        SourceList::from_config(&self.config)
    }

    /// The configured registries, or `None` when none are configured.
    pub fn optional_registry(&self) -> Result<Option<SourceList>> {
        if self.config.registry.sources.is_empty() {
            return Ok(None);
        }
        self.registry().map(Some)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.config.cache.resolve_dir(&self.project.state_dir.join("cache"))
    }

    pub fn cache(&self) -> Result<ArtifactCache> {
        ArtifactCache::open(self.cache_dir())
    }

    pub fn transport(&self) -> Result<DefaultTransport> {
        DefaultTransport::new(self.config.fetch.timeout)
    }

    #[must_use]
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            concurrency: self.config.fetch.concurrency,
            cancel: self.cancel.clone(),
        }
    }

    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::from_fetch_config(&self.config.fetch)
    }
}
