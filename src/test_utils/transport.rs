//! In-memory transports for cache and synchronizer tests.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::fetch::Transport;

/// Serves fixed bodies by URL; anything else is `NotFound`.
#[derive(Default)]
pub struct StaticTransport {
    bodies: RwLock<HashMap<String, Vec<u8>>>,
}

impl StaticTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, url: &str, body: &[u8]) -> Self {
        self.insert(url, body);
        self
    }

    /// Replace the body served for `url`.
    pub fn insert(&self, url: &str, body: &[u8]) {
        self.bodies.write().insert(url.to_string(), body.to_vec());
    }
}

impl Transport for StaticTransport {
    fn open(&self, url: &str) -> io::Result<Box<dyn Read + Send>> {
        self.bodies.read().get(url).map_or_else(
            || Err(io::Error::new(io::ErrorKind::NotFound, format!("no body for {url}"))),
            |body| Ok(Box::new(Cursor::new(body.clone())) as Box<dyn Read + Send>),
        )
    }
}

/// Counts calls to the wrapped transport.
pub struct CountingTransport<T> {
    inner: T,
    calls: AtomicUsize,
}

impl<T: Transport> CountingTransport<T> {
    pub const fn new(inner: T) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub const fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for CountingTransport<T> {
    fn open(&self, url: &str) -> io::Result<Box<dyn Read + Send>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.open(url)
    }
}

/// Fails the first `failures` calls with a connection reset.
pub struct FlakyTransport<T> {
    inner: T,
    failures: usize,
    calls: AtomicUsize,
}

impl<T: Transport> FlakyTransport<T> {
    pub const fn new(failures: usize, inner: T) -> Self {
        Self {
            inner,
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T: Transport> Transport for FlakyTransport<T> {
    fn open(&self, url: &str) -> io::Result<Box<dyn Read + Send>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                format!("simulated failure {} for {url}", call + 1),
            ));
        }
        self.inner.open(url)
    }
}
