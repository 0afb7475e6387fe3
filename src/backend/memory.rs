//! In-Memory Backend
//!
//! Concurrent key-to-record map using DashMap. Insertion goes through the
//! entry API so a generated key is claimed atomically; a plain
//! check-then-insert would let two concurrent `set` calls race the same
//! candidate key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::keygen;

use super::Backend;

/// A stored session: the opaque payload and its absolute expiration.
#[derive(Debug, Clone)]
struct SessionRecord {
    payload: Bytes,
    expires_at: Instant,
}

impl SessionRecord {
    fn new(payload: Bytes, ttl: Duration) -> Self {
        Self {
            payload,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// In-memory session storage. Records live only as long as the process.
pub struct InMemoryBackend {
    records: DashMap<String, SessionRecord>,
    key_length: usize,
    key_ttl: Duration,
}

impl InMemoryBackend {
    /// Create an empty backend generating keys of `key_length` characters
    /// that expire after `key_ttl`.
    pub fn new(key_length: usize, key_ttl: Duration) -> Self {
        Self {
            records: DashMap::new(),
            key_length,
            key_ttl,
        }
    }

    /// Claim a fresh key for `payload`. Regenerates on collision; the
    /// vacant-entry insert is what makes the claim atomic.
    fn insert_new(&self, payload: Bytes) -> Result<String> {
        loop {
            let key = keygen::generate(self.key_length)?;
            match self.records.entry(key.clone()) {
                Entry::Occupied(_) => {
                    debug!(key_length = self.key_length, "key collision, regenerating");
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(SessionRecord::new(payload, self.key_ttl));
                    return Ok(key);
                }
            }
        }
    }

    /// Number of records, including any not yet swept.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the backend holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All stored keys, unexpired ones only.
    pub fn live_keys(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.value().is_expired())
            .map(|r| r.key().clone())
            .collect()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn set(&self, payload: Bytes) -> Result<String> {
        if payload.is_empty() {
            return Err(Error::NilPayload);
        }
        self.insert_new(payload)
    }

    async fn get_and_rotate(&self, key: &str) -> Result<(Bytes, String)> {
        // Removal invalidates the presented key atomically; the record is
        // gone for every other caller before the replacement is claimed.
        let (_, record) = self.records.remove(key).ok_or(Error::NotFound)?;

        if record.is_expired() {
            trace!(key, "consumed expired record");
            return Err(Error::Expired);
        }

        let new_key = self.insert_new(record.payload.clone())?;
        trace!(key, new_key = %new_key, "rotated session key");
        Ok((record.payload, new_key))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }

    async fn clear_expired(&self) -> Result<usize> {
        let mut removed = 0;
        self.records.retain(|_, record| {
            if record.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            debug!(removed, "evicted expired session records");
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        self.records.clear();
        Ok(())
    }

    fn native_ttl(&self) -> bool {
        false
    }
}
