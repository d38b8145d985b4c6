use std::collections::HashSet;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::ports::{Clock, InviteSource};
use crate::domain::services::lifecycle::normalize_code;

pub const CACHE_TTL_SECONDS: i64 = 60;

struct CacheEntry {
    codes: Arc<HashSet<String>>,
    fetched_at: DateTime<Utc>,
}

/// Process-wide view of the external invite-code list. The cache trades
/// freshness for availability: a stale list (or the configured fallback) is
/// always preferred over failing a checkout because the sheet is down.
pub struct InviteRegistry {
    source: Arc<dyn InviteSource>,
    clock: Arc<dyn Clock>,
    fallback: Arc<HashSet<String>>,
    cache: RwLock<Option<CacheEntry>>,
}

impl InviteRegistry {
    pub fn new(source: Arc<dyn InviteSource>, clock: Arc<dyn Clock>, fallback_codes: Vec<String>) -> Self {
        let fallback = fallback_codes.iter().map(|c| normalize_code(c)).collect();
        Self {
            source,
            clock,
            fallback: Arc::new(fallback),
            cache: RwLock::new(None),
        }
    }

    pub async fn is_valid(&self, code: &str) -> bool {
        self.valid_codes().await.contains(&normalize_code(code))
    }

    pub async fn valid_codes(&self) -> Arc<HashSet<String>> {
        let now = self.clock.now();

        {
            let guard = self.cache.read().await;
            if let Some(entry) = guard.as_ref()
                && now - entry.fetched_at < Duration::seconds(CACHE_TTL_SECONDS) {
                return entry.codes.clone();
            }
        }

        match self.source.fetch_codes().await {
            Ok(raw) => {
                let codes: Arc<HashSet<String>> =
                    Arc::new(raw.iter().map(|c| normalize_code(c)).collect());
                // Concurrent refreshes may overwrite each other; the cache is
                // an optimization, not a correctness boundary.
                let mut guard = self.cache.write().await;
                *guard = Some(CacheEntry { codes: codes.clone(), fetched_at: now });
                info!("Invite code list refreshed ({} codes)", codes.len());
                codes
            }
            Err(e) => {
                let guard = self.cache.read().await;
                if let Some(entry) = guard.as_ref() {
                    warn!("Invite source fetch failed, serving stale cache: {:?}", e);
                    entry.codes.clone()
                } else {
                    warn!("Invite source fetch failed with empty cache, using fallback list: {:?}", e);
                    self.fallback.clone()
                }
            }
        }
    }
}
