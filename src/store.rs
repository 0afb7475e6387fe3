//! Session Store
//!
//! The facade clients use. Owns one backend behind a single store-wide
//! lock and, when auto-clear is enabled on the in-memory backend, a
//! background expiration sweeper.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::{Backend, ExternalCacheBackend, InMemoryBackend};
use crate::config::StoreOptions;
use crate::error::Result;
use crate::keygen;
use crate::sweeper::SweeperHandle;

/// Single-use session key store.
///
/// Every operation takes a store-wide lock before delegating to the
/// backend, trading throughput for a totally ordered, auditable
/// consistency story. Create one with [`SessionStore::new`] and tear it
/// down with [`SessionStore::destroy`], which stops the sweeper
/// deterministically. `destroy` consumes the store, so no operation can
/// run afterwards.
pub struct SessionStore {
    backend: Arc<Mutex<Box<dyn Backend>>>,
    sweeper: Option<SweeperHandle>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sweeper", &self.sweeper.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Build a store from the given options.
    ///
    /// Validates all options together, probes the secure randomness
    /// source (a store cannot operate without it), connects the external
    /// backend if one was configured, and starts the sweeper when
    /// auto-clear was requested on a backend without native TTL.
    pub async fn new(options: StoreOptions) -> Result<Self> {
        let config = options.resolve()?;
        keygen::probe_entropy()?;

        let backend: Box<dyn Backend> = match config.redis_client {
            Some(client) => Box::new(
                ExternalCacheBackend::connect(client, config.key_length, config.key_ttl).await?,
            ),
            None => Box::new(InMemoryBackend::new(config.key_length, config.key_ttl)),
        };

        let needs_sweeper = config.auto_clear_expired && !backend.native_ttl();
        let backend = Arc::new(Mutex::new(backend));

        let sweeper = if needs_sweeper {
            // Sweep on the same cadence keys expire.
            Some(SweeperHandle::spawn(backend.clone(), config.key_ttl))
        } else {
            None
        };

        debug!(
            key_length = config.key_length,
            key_ttl = ?config.key_ttl,
            sweeper = sweeper.is_some(),
            "session store created"
        );

        Ok(Self { backend, sweeper })
    }

    /// Mint a fresh key for `payload`.
    pub async fn set(&self, payload: Bytes) -> Result<String> {
        self.backend.lock().await.set(payload).await
    }

    /// Consume `key`, returning its payload and a replacement key bound
    /// to the same payload. The presented key is invalid afterwards.
    pub async fn get(&self, key: &str) -> Result<(Bytes, String)> {
        self.backend.lock().await.get_and_rotate(key).await
    }

    /// Terminate the session at `key` early. Removing an absent key is
    /// not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.backend.lock().await.remove(key).await
    }

    /// Evict every expired record, returning the count. A no-op for
    /// backends with native TTL.
    pub async fn clear_expired(&self) -> Result<usize> {
        self.backend.lock().await.clear_expired().await
    }

    /// Drop every session, live or expired.
    pub async fn clear(&self) -> Result<()> {
        self.backend.lock().await.clear().await
    }

    /// Tear the store down, stopping any running sweeper before the
    /// store is released. Consumes the store; operations after teardown
    /// are a compile error rather than undefined behavior.
    pub async fn destroy(self) {
        if let Some(sweeper) = self.sweeper {
            sweeper.stop().await;
        }
        debug!("session store destroyed");
    }
}
