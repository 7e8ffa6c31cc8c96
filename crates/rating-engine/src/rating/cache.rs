use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::domain::EvaluationResult;

/// Injected response cache keyed by scenario fingerprint.
///
/// Capacity and TTL are constructor parameters rather than module-level
/// state, so every caller (and every test) owns an isolated instance. The
/// key must be the scenario fingerprint, which covers every input that feeds
/// the result hash; a stale or partial key would serve a result whose hash
/// the scenario could not reproduce.
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
    ttl: Duration,
}

struct CacheInner {
    entries: HashMap<String, CachedEntry>,
    recency: VecDeque<String>,
}

struct CachedEntry {
    result: EvaluationResult,
    stored_at: Instant,
}

impl ResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                recency: VecDeque::new(),
            }),
            capacity,
            ttl,
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<EvaluationResult> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");

        let expired = match inner.entries.get(fingerprint) {
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            inner.entries.remove(fingerprint);
            inner.recency.retain(|key| key != fingerprint);
            return None;
        }

        Self::touch(&mut inner.recency, fingerprint);
        inner
            .entries
            .get(fingerprint)
            .map(|entry| entry.result.clone())
    }

    pub fn insert(&self, fingerprint: String, result: EvaluationResult) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.lock().expect("cache mutex poisoned");

        if inner.entries.contains_key(&fingerprint) {
            Self::touch(&mut inner.recency, &fingerprint);
        } else {
            while inner.entries.len() >= self.capacity {
                match inner.recency.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            inner.recency.push_back(fingerprint.clone());
        }

        inner.entries.insert(
            fingerprint,
            CachedEntry {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(recency: &mut VecDeque<String>, fingerprint: &str) {
        recency.retain(|key| key != fingerprint);
        recency.push_back(fingerprint.to_string());
    }
}
