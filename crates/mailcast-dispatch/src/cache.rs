use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use mailcast_common::types::Campaign;
use std::sync::Mutex;

struct Snapshot {
    campaigns: Vec<Campaign>,
    fetched_at: DateTime<Utc>,
}

/// Short-lived snapshot of the full campaign set, so a one-minute tick does
/// not re-read the store every time.
///
/// The snapshot is unfiltered; activity filtering happens after retrieval.
/// Correctness never depends on freshness: the engine's flag writes always
/// target the live store, so a stale snapshot can only delay a campaign's
/// first dispatch, never duplicate one.
pub struct CampaignCache {
    enabled: bool,
    ttl_secs: i64,
    inner: Mutex<Option<Snapshot>>,
}

impl CampaignCache {
    pub fn new(enabled: bool, ttl_secs: u64) -> Self {
        Self {
            enabled,
            ttl_secs: ttl_secs as i64,
            inner: Mutex::new(None),
        }
    }

    /// A cache that always loads fresh.
    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    /// Returns the cached snapshot if it is younger than the TTL, otherwise
    /// invokes `load` and caches its result. Disabled caches always load.
    pub fn get_or_refresh<F>(&self, now: DateTime<Utc>, load: F) -> Result<Vec<Campaign>>
    where
        F: FnOnce() -> Result<Vec<Campaign>>,
    {
        if !self.enabled {
            return load();
        }

        let mut inner = self.inner.lock().unwrap();
        if let Some(snapshot) = inner.as_ref() {
            if now - snapshot.fetched_at < Duration::seconds(self.ttl_secs) {
                return Ok(snapshot.campaigns.clone());
            }
        }

        let campaigns = load()?;
        *inner = Some(Snapshot {
            campaigns: campaigns.clone(),
            fetched_at: now,
        });
        Ok(campaigns)
    }

    /// Drops the snapshot; the next call loads fresh.
    pub fn invalidate(&self) {
        *self.inner.lock().unwrap() = None;
    }
}
