//! publication service owning the cache lifecycle.
//!
//! on construction the service scans the repository, serializes every key
//! into one buffer and installs it in the cache; a background task repeats
//! that hydration on a fixed interval. uploads go straight to the
//! repository and become visible no later than one interval after
//! acknowledgement.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use diagserve_db::{DiagDb, Error, Repository};
use diagserve_types::{Config, DiagnosisKey, TemporaryExposureKey, wire};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cache::KeyCache;

struct Inner {
    db: DiagDb,
    cache: Arc<KeyCache>,
    max_upload_batch_size: usize,
    // dropping this stops the refresh task
    _shutdown: watch::Sender<()>,
}

/// the diagnosis key publication service.
///
/// cheap to clone; all clones share one cache and one refresh task. the
/// task stops when the last clone is dropped.
#[derive(Clone)]
pub struct DiagService {
    inner: Arc<Inner>,
}

impl DiagService {
    /// construct the service: hydrate the cache from the repository and
    /// spawn the periodic refresh task. fails if the initial scan fails.
    pub async fn new(db: DiagDb, config: &Config) -> Result<Self, Error> {
        let cache = Arc::new(KeyCache::new());

        let count = hydrate(&db, &cache).await?;
        info!(keys = count, "cache hydrated");

        let (shutdown, shutdown_rx) = watch::channel(());
        spawn_refresher(
            db.clone(),
            Arc::clone(&cache),
            config.cache_refresh_interval(),
            shutdown_rx,
        );

        Ok(Self {
            inner: Arc::new(Inner {
                db,
                cache,
                max_upload_batch_size: config.max_upload_batch_size,
                _shutdown: shutdown,
            }),
        })
    }

    /// run one hydration cycle immediately. the ticker calls this on its
    /// own; it is public so tests can force visibility without waiting.
    pub async fn refresh(&self) -> Result<usize, Error> {
        hydrate(&self.inner.db, &self.inner.cache).await
    }

    /// persist an upload batch, stamping it with the current time. the
    /// cache is deliberately left alone: new keys become visible with the
    /// next refresh cycle.
    pub async fn store(&self, keys: Vec<DiagnosisKey>) -> Result<u64, Error> {
        let uploaded_at = Utc::now();
        let start = Instant::now();

        let result = self.inner.db.store_diagnosis_keys(&keys, uploaded_at).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(inserted) => {
                debug!(
                    received = keys.len(),
                    inserted, elapsed_ms, "stored diagnosis keys"
                );
                Ok(inserted)
            }
            Err(e) => {
                error!(
                    error = %e,
                    operation = "store_diagnosis_keys",
                    elapsed_ms,
                    "repository failure"
                );
                Err(e)
            }
        }
    }

    /// serialized keys strictly after `cursor`, with the snapshot's
    /// last-modified timestamp. the zero cursor lists everything.
    pub fn list(&self, cursor: &TemporaryExposureKey) -> (Bytes, Option<DateTime<Utc>>) {
        let snapshot = self.inner.cache.snapshot();
        (snapshot.after(cursor), snapshot.last_modified())
    }

    /// upper bound on keys accepted per upload.
    pub fn max_upload_batch_size(&self) -> usize {
        self.inner.max_upload_batch_size
    }
}

/// rebuild the cache from a full repository scan.
async fn hydrate(db: &DiagDb, cache: &KeyCache) -> Result<usize, Error> {
    let keys = db.find_all_diagnosis_keys().await?;
    let last_modified = match db.last_modified().await {
        Ok(ts) => Some(ts),
        Err(Error::EmptyBatch) => None,
        Err(e) => return Err(e),
    };

    cache.replace(Bytes::from(wire::encode(&keys)), last_modified);
    Ok(keys.len())
}

/// spawn the periodic rehydration task. a failed cycle is logged and the
/// previous snapshot stays in place; the task stops when `shutdown`'s
/// sender is dropped.
fn spawn_refresher(
    db: DiagDb,
    cache: Arc<KeyCache>,
    interval: Duration,
    mut shutdown: watch::Receiver<()>,
) {
    if interval.is_zero() {
        debug!("cache refresh disabled (interval = 0)");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // the first tick completes immediately; construction already
        // hydrated, so consume it before looping
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => match hydrate(&db, &cache).await {
                    Ok(count) => debug!(keys = count, "cache refreshed"),
                    Err(e) => {
                        warn!(error = %e, "cache refresh failed, keeping previous snapshot");
                    }
                },
                _ = shutdown.changed() => {
                    debug!("refresh task stopping");
                    break;
                }
            }
        }
    });
}
