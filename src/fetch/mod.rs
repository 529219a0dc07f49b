//! Artifact transports and the content-addressed cache.
//!
//! A [`Transport`] only moves bytes. Whether those bytes are the right ones
//! is decided by the cache, which hashes every download before keeping it.

pub mod cache;

use std::fs::File;
use std::io::{self, Read};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::error::{Result, SkillError};
use crate::registry::http::USER_AGENT;
use crate::registry::local::path_from_file_url;

pub use cache::{ArtifactCache, CacheEntry, PruneReport, VerifyReport};

/// Opens a readable stream for an artifact URL.
pub trait Transport: Send + Sync {
    fn open(&self, url: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Errors that are not worth another attempt.
pub(crate) fn is_permanent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::Unsupported
    )
}

/// Streams `http://` and `https://` artifacts.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| SkillError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn open(&self, url: &str) -> io::Result<Box<dyn Read + Send>> {
        let response = self.client.get(url).send().map_err(io::Error::other)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{url}: HTTP 404"),
            ));
        }
        if !status.is_success() {
            return Err(io::Error::other(format!("{url}: HTTP {}", status.as_u16())));
        }
        Ok(Box::new(response))
    }
}

/// Reads `file://` artifacts from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTransport;

impl Transport for FileTransport {
    fn open(&self, url: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = path_from_file_url(url).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("not a file url: {url}"))
        })?;
        Ok(Box::new(File::open(path)?))
    }
}

/// Picks the transport from the URL scheme.
pub struct DefaultTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl DefaultTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new(timeout)?,
            file: FileTransport,
        })
    }
}

impl Transport for DefaultTransport {
    fn open(&self, url: &str) -> io::Result<Box<dyn Read + Send>> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.http.open(url)
        } else if url.starts_with("file://") {
            self.file.open(url)
        } else {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported artifact url: {url}"),
            ))
        }
    }
}
