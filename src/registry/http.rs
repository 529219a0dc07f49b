//! Registry served over HTTP(S).
//!
//! Layout: `GET {base}/index/{name}.json` returns the [`IndexEntry`] for one
//! skill. Relative artifact URLs are resolved against `{base}`.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::debug;

use super::{IndexEntry, RegistryClient};
use crate::error::{Result, SkillError};

pub(crate) const USER_AGENT: &str = concat!("skill/", env!("CARGO_PKG_VERSION"));

pub struct HttpRegistry {
    base: String,
    client: Client,
}

impl HttpRegistry {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| SkillError::Config(format!("build HTTP client: {err}")))?;
        Ok(Self::with_client(base_url, client))
    }

    #[must_use]
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn index_url(&self, name: &str) -> String {
        format!("{}/index/{}.json", self.base, urlencoding::encode(name))
    }

    fn unavailable(&self, reason: impl Into<String>) -> SkillError {
        SkillError::RegistryUnavailable {
            source_url: self.base.clone(),
            reason: reason.into(),
        }
    }
}

impl RegistryClient for HttpRegistry {
    fn source(&self) -> &str {
        &self.base
    }

    fn fetch_index(&self, name: &str) -> Result<IndexEntry> {
        let url = self.index_url(name);
        debug!(%url, "fetching registry index");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|err| self.unavailable(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SkillError::NotFound {
                name: name.to_string(),
            });
        }
        if !status.is_success() {
            return Err(self.unavailable(format!("HTTP {status} for {url}")));
        }

        let body = response
            .bytes()
            .map_err(|err| self.unavailable(format!("read index body: {err}")))?;

        IndexEntry::from_json(name, &body, &self.base, |relative| {
            format!("{}/{}", self.base, relative.trim_start_matches('/'))
        })
    }
}
