//! Remote trust-directory cache.
//!
//! The directory is a line-oriented text document fetched from a fixed URL.
//! A successful refresh parses the whole body into a fresh
//! [`DirectorySnapshot`] and publishes it with a single pointer swap; a
//! failed refresh is a strict no-op against the previous snapshot.  Refreshes
//! run on the tokio runtime so the per-frame tick path never blocks on the
//! network.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;

use crate::types::{DirectorySnapshot, TrustRecord};

/// Field separator of the directory feed.
pub const FIELD_SEPARATOR: char = ';';

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("directory fetch returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Transport seam for the directory feed.
///
/// The cache only needs the raw document body; tests substitute an in-memory
/// fetcher here.
#[async_trait]
pub trait DirectoryFetcher: Send + Sync {
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Production fetcher: `GET <url>?t=<nanos>` over reqwest.
///
/// The `t` query parameter busts intermediary caches so a refresh always
/// observes the latest upstream revision.
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl DirectoryFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<String, FetchError> {
        let token = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let response = self
            .client
            .get(&self.url)
            .query(&[("t", token.to_string())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }
}

/// Parse one directory line.  Returns `None` for ignorable lines (blank, or
/// missing the separator); such lines never fail the batch.
fn parse_line(line: &str) -> Option<(String, TrustRecord)> {
    if line.trim().is_empty() || !line.contains(FIELD_SEPARATOR) {
        return None;
    }
    let mut fields = line.split(FIELD_SEPARATOR);
    let id = fields.next()?.trim().to_string();
    let rest: Vec<&str> = fields.collect();
    let display_name = rest.first().map(|f| f.trim()).unwrap_or_default().to_string();
    let role = match rest.as_slice() {
        [] => return None,
        [_] => TrustRecord::DEFAULT_ROLE.to_string(),
        [.., last] => last.trim().to_string(),
    };
    Some((id, TrustRecord { display_name, role }))
}

struct CacheState {
    snapshot: ArcSwap<DirectorySnapshot>,
    fetcher: Arc<dyn DirectoryFetcher>,
    in_flight: AtomicBool,
    next_version: AtomicU64,
}

impl CacheState {
    /// Fetch, parse and publish.  Publication is a single pointer swap, so
    /// `current()` readers observe either the old snapshot or the new one in
    /// full, never a mix.
    async fn refresh(&self) -> Result<Arc<DirectorySnapshot>, FetchError> {
        let body = self.fetcher.fetch().await?;
        let mut records = std::collections::HashMap::new();
        let mut skipped = 0usize;
        for line in body.lines() {
            match parse_line(line) {
                Some((id, record)) => {
                    records.insert(id, record);
                }
                None => skipped += 1,
            }
        }
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        let snapshot = Arc::new(DirectorySnapshot { records, version });
        debug!(
            "Parsed directory: {} records, {} ignorable lines",
            snapshot.len(),
            skipped
        );
        self.snapshot.store(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}

/// Bounded-staleness cache over the remote directory.
///
/// At most one refresh is in flight at a time; triggers arriving while one is
/// outstanding are no-ops.  All failures are absorbed here and logged, per
/// the best-effort contract: callers only ever see the last good snapshot.
pub struct DirectoryCache {
    state: Arc<CacheState>,
    runtime: tokio::runtime::Handle,
    refresh_interval: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl DirectoryCache {
    pub fn new(
        fetcher: Arc<dyn DirectoryFetcher>,
        refresh_interval: Duration,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            state: Arc::new(CacheState {
                snapshot: ArcSwap::from_pointee(DirectorySnapshot::default()),
                fetcher,
                in_flight: AtomicBool::new(false),
                next_version: AtomicU64::new(1),
            }),
            runtime,
            refresh_interval,
            last_attempt: Mutex::new(None),
        }
    }

    /// Last successfully published snapshot, or the empty snapshot if no
    /// refresh has ever succeeded.
    pub fn current(&self) -> Arc<DirectorySnapshot> {
        self.state.snapshot.load_full()
    }

    /// Direct refresh path.  Background triggers funnel through this; tests
    /// call it to refresh deterministically.
    pub async fn refresh(&self) -> Result<Arc<DirectorySnapshot>, FetchError> {
        self.state.refresh().await
    }

    /// Spawn a background refresh if the interval has elapsed since the last
    /// attempt, or if none has ever run.
    pub fn maybe_refresh(&self) {
        let due = {
            let last = self
                .last_attempt
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match *last {
                None => true,
                Some(at) => at.elapsed() >= self.refresh_interval,
            }
        };
        if due {
            self.trigger();
        }
    }

    /// Spawn a background refresh regardless of the timer.  Still a no-op
    /// while another refresh is outstanding.
    pub fn force_refresh(&self) {
        self.trigger();
    }

    fn trigger(&self) {
        if self
            .state
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Directory refresh already in flight, ignoring trigger");
            return;
        }
        *self
            .last_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());

        let state = Arc::clone(&self.state);
        self.runtime.spawn(async move {
            match state.refresh().await {
                Ok(snapshot) => info!(
                    "Directory refreshed: {} records (version {})",
                    snapshot.len(),
                    snapshot.version
                ),
                Err(e) => warn!("Directory refresh failed: {}. Keeping previous snapshot.", e),
            }
            state.in_flight.store(false, Ordering::Release);
        });
    }
}
