//! MX resolution with an in-process cache. Both positive hits (the primary
//! exchanger) and negative outcomes (no MX, NXDOMAIN, resolver timeout) are
//! memoized. Entries expire after a TTL since MX records do change, and the
//! map is bounded so long-running processes don't leak.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use tokio::sync::RwLock;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_CAPACITY: usize = 10_000;

#[async_trait]
pub trait MxLookup: Send + Sync {
    /// Returns (preference, exchange host) pairs; an empty list means the
    /// domain publishes no MX records.
    async fn lookup_mx(&self, domain: &str) -> anyhow::Result<Vec<(u16, String)>>;
}

pub struct DnsMxLookup {
    resolver: TokioAsyncResolver,
}

impl DnsMxLookup {
    pub fn from_system_conf() -> anyhow::Result<Self> {
        Ok(Self {
            resolver: TokioAsyncResolver::tokio_from_system_conf()?,
        })
    }
}

#[async_trait]
impl MxLookup for DnsMxLookup {
    async fn lookup_mx(&self, domain: &str) -> anyhow::Result<Vec<(u16, String)>> {
        let response = self.resolver.mx_lookup(domain).await?;
        Ok(response
            .iter()
            .map(|mx| {
                let host = mx.exchange().to_utf8();
                (mx.preference(), host.trim_end_matches('.').to_string())
            })
            .collect())
    }
}

struct CacheEntry {
    exchange: Option<String>,
    inserted: Instant,
}

pub struct MxCache {
    lookup: Arc<dyn MxLookup>,
    ttl: Duration,
    capacity: usize,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MxCache {
    pub fn new(lookup: Arc<dyn MxLookup>) -> Self {
        Self::with_limits(lookup, DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_limits(lookup: Arc<dyn MxLookup>, ttl: Duration, capacity: usize) -> Self {
        Self {
            lookup,
            ttl,
            capacity,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Primary mail exchanger for `domain` (lowest MX preference), or `None`
    /// when the domain has no usable MX. Resolution failures count as
    /// negative outcomes and are cached like any other.
    pub async fn resolve(&self, domain: &str) -> Option<String> {
        let key = domain.to_ascii_lowercase();
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.inserted.elapsed() < self.ttl {
                    return entry.exchange.clone();
                }
            }
        }

        let exchange = match self.lookup.lookup_mx(&key).await {
            Ok(mut records) if !records.is_empty() => {
                records.sort_by_key(|(preference, _)| *preference);
                Some(records.remove(0).1)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(domain = %key, error = %e, "mx lookup failed");
                None
            }
        };

        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.inserted.elapsed() < self.ttl);
        if entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted)
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                entries.remove(&k);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                exchange: exchange.clone(),
                inserted: Instant::now(),
            },
        );
        exchange
    }
}
