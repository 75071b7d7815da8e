// GRC ACL
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Permission decision caching

use crate::rbac::permissions::Action;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,

    pub misses: u64,

    /// Entries dropped on expiry
    pub evictions: u64,

    /// Entries dropped because the underlying grants changed
    pub invalidations: u64,

    pub current_size: usize,

    pub max_size_reached: usize,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        if self.hits + self.misses == 0 { 0.0 } else { self.hits as f64 / (self.hits + self.misses) as f64 }
    }
}

/// Cache of permission decisions keyed by person, action and object
#[derive(Debug)]
pub struct PermissionCache {
    decisions: DashMap<String, CacheEntry<bool>>,
    ttl: Duration,
    stats: Arc<RwLock<CacheStats>>,
    /// Bumped on every invalidation; decisions computed under an older generation are not stored
    generation: AtomicU64,
}

impl PermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            decisions: DashMap::new(),
            ttl,
            stats: Arc::new(RwLock::new(CacheStats::default())),
            generation: AtomicU64::new(0),
        }
    }

    /// Read before evaluating a decision and pass to [`PermissionCache::set`]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Key of one decision; the person id leads so a person's entries can be dropped together
    pub fn key(person_id: &str, action: Action, object_id: &str) -> String {
        format!("{}:{}:{}", person_id, action, object_id)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub async fn get(&self, key: &str) -> Option<bool> {
        if !self.is_enabled() {
            return None;
        }

        if let Some(entry) = self.decisions.get(key) {
            if !entry.is_expired() {
                let value = entry.value;
                drop(entry);
                if let Ok(mut stats) = self.stats.try_write() {
                    stats.hits += 1;
                }
                debug!("Permission cache hit for key: {}", key);
                return Some(value);
            }
        }

        if self.decisions.remove_if(key, |_, entry| entry.is_expired()).is_some() {
            if let Ok(mut stats) = self.stats.try_write() {
                stats.evictions += 1;
            }
        }

        if let Ok(mut stats) = self.stats.try_write() {
            stats.misses += 1;
        }
        debug!("Permission cache miss for key: {}", key);
        None
    }

    /// Store a decision evaluated under `generation`
    ///
    /// Returns false when an invalidation happened since, in which case nothing is kept.
    pub async fn set(&self, key: String, allowed: bool, generation: u64) -> bool {
        if !self.is_enabled() || self.generation() != generation {
            return false;
        }

        self.decisions.insert(key.clone(), CacheEntry::new(allowed, self.ttl));

        // An invalidation may have run between the check above and the insert
        if self.generation() != generation {
            self.decisions.remove(&key);
            return false;
        }

        self.update_cache_size().await;
        true
    }

    /// Drop every decision made for a person
    pub async fn invalidate_person(&self, person_id: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let prefix = format!("{}:", person_id);
        let before = self.decisions.len();
        self.decisions.retain(|key, _| !key.starts_with(&prefix));
        let removed = before.saturating_sub(self.decisions.len());

        let mut stats = self.stats.write().await;
        stats.invalidations += removed as u64;
        self.update_cache_size_internal(&mut stats);
        debug!("Invalidated {} cached decisions for person: {}", removed, person_id);
    }

    /// Drop every decision
    pub async fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let removed = self.decisions.len();
        self.decisions.clear();

        let mut stats = self.stats.write().await;
        stats.invalidations += removed as u64;
        stats.current_size = 0;
        debug!("Cleared all cache entries");
    }

    pub async fn cleanup_expired(&self) {
        let mut evicted = 0;

        self.decisions.retain(|_, entry| {
            if entry.is_expired() {
                evicted += 1;
                false
            } else {
                true
            }
        });

        if evicted > 0 {
            let mut stats = self.stats.write().await;
            stats.evictions += evicted;
            self.update_cache_size_internal(&mut stats);
            debug!("Cleaned up {} expired cache entries", evicted);
        }
    }

    pub async fn get_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    async fn update_cache_size(&self) {
        let mut stats = self.stats.write().await;
        self.update_cache_size_internal(&mut stats);
    }

    fn update_cache_size_internal(&self, stats: &mut CacheStats) {
        stats.current_size = self.decisions.len();
        if stats.current_size > stats.max_size_reached {
            stats.max_size_reached = stats.current_size;
        }
    }

    /// Start background cleanup task
    pub fn start_cleanup_task(cache: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;
                cache.cleanup_expired().await;

                let stats = cache.get_stats().await;
                if stats.hits + stats.misses > 1000 && stats.hit_ratio() < 0.5 {
                    warn!("Low permission cache hit ratio: {:.2}", stats.hit_ratio());
                }
            }
        })
    }
}
