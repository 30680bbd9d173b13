use super::KeyValueStore;
use crate::error::{RepertoireError, Result};
use crate::model::{OpeningRecord, StoredOpening};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Key under which every opening record is stored.
pub const OPENINGS_KEY: &str = "chessOpenings";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(1);

/// Typical browser local-storage budget the store is sized against.
pub const STORAGE_LIMIT_BYTES: usize = 5 * 1024 * 1024;
const WARNING_RATIO: f64 = 0.9;

pub type OpeningMap = BTreeMap<String, OpeningRecord>;

#[derive(Debug, Clone, PartialEq)]
pub struct QuotaStatus {
    pub used_bytes: usize,
    pub limit_bytes: usize,
}

impl QuotaStatus {
    pub fn percent(&self) -> f64 {
        self.used_bytes as f64 / self.limit_bytes as f64 * 100.0
    }

    pub fn is_warning(&self) -> bool {
        self.used_bytes as f64 > self.limit_bytes as f64 * WARNING_RATIO
    }

    pub fn message(&self) -> String {
        format!(
            "Storage is {:.1}% full. Consider exporting and deleting old openings.",
            self.percent()
        )
    }
}

struct CachedOpenings {
    loaded_at: Instant,
    openings: OpeningMap,
}

/// Opening records on top of a [`KeyValueStore`].
///
/// Reads go through a short-lived cache so that a burst of UI queries parses
/// the namespace once. Every write drops the cache.
pub struct OpeningStore<S: KeyValueStore> {
    kv: S,
    ttl: Duration,
    cache: RefCell<Option<CachedOpenings>>,
}

impl<S: KeyValueStore> OpeningStore<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            ttl: DEFAULT_CACHE_TTL,
            cache: RefCell::new(None),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Mutable access to the backend. Drops the cache, since the caller may
    /// write to the openings namespace.
    pub fn kv_mut(&mut self) -> &mut S {
        self.invalidate();
        &mut self.kv
    }

    pub fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    pub fn is_cached(&self) -> bool {
        self.cache
            .borrow()
            .as_ref()
            .is_some_and(|c| c.loaded_at.elapsed() < self.ttl)
    }

    /// All records in canonical shape, keyed by store key.
    pub fn openings(&self) -> Result<OpeningMap> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.openings.clone());
            }
        }

        let openings = self
            .raw_openings()?
            .into_iter()
            .filter_map(|(key, stored)| match stored.normalize(&key) {
                Some(record) => Some((key, record)),
                None => {
                    warn!(key = %key, "skipping opening with no moves");
                    None
                }
            })
            .collect::<OpeningMap>();

        debug!(count = openings.len(), "loaded openings from store");
        *self.cache.borrow_mut() = Some(CachedOpenings {
            loaded_at: Instant::now(),
            openings: openings.clone(),
        });
        Ok(openings)
    }

    /// Records exactly as stored, before normalization.
    pub fn raw_openings(&self) -> Result<BTreeMap<String, StoredOpening>> {
        match self.kv.get(OPENINGS_KEY)? {
            None => Ok(BTreeMap::new()),
            Some(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(RepertoireError::Serialization),
        }
    }

    pub fn get(&self, key: &str) -> Result<OpeningRecord> {
        self.openings()?
            .remove(key)
            .ok_or_else(|| RepertoireError::OpeningNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.openings()?.contains_key(key))
    }

    pub fn save(&mut self, key: &str, record: OpeningRecord) -> Result<()> {
        let mut openings = self.openings()?;
        openings.insert(key.to_string(), record);
        self.replace_all(&openings)
    }

    pub fn remove(&mut self, key: &str) -> Result<OpeningRecord> {
        let mut openings = self.openings()?;
        let removed = openings
            .remove(key)
            .ok_or_else(|| RepertoireError::OpeningNotFound(key.to_string()))?;
        self.replace_all(&openings)?;
        Ok(removed)
    }

    /// Overwrites the whole namespace with `openings`.
    pub fn replace_all(&mut self, openings: &OpeningMap) -> Result<()> {
        let serialized = serde_json::to_string(openings).map_err(RepertoireError::Serialization)?;
        self.invalidate();
        self.kv.set(OPENINGS_KEY, serialized)?;
        debug!(count = openings.len(), "wrote openings to store");
        Ok(())
    }

    pub fn quota(&self) -> Result<QuotaStatus> {
        Ok(QuotaStatus {
            used_bytes: self.kv.total_size()?,
            limit_bytes: STORAGE_LIMIT_BYTES,
        })
    }

    /// Fails with [`RepertoireError::Quota`] when storage is near its limit.
    pub fn ensure_capacity(&self) -> Result<()> {
        let quota = self.quota()?;
        if quota.is_warning() {
            return Err(RepertoireError::Quota(quota.message()));
        }
        Ok(())
    }
}
