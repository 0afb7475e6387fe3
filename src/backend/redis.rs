//! External Cache Backend
//!
//! Adapter over a Redis-compatible key-value service. Collision-free
//! insertion is delegated to the service's conditional write (`SET NX`),
//! and expiration to its native per-key TTL, so no local state or sweeper
//! is needed.
//!
//! Consume-and-reissue runs as `GETDEL` followed by a fresh `SET NX`. The
//! consume itself is a single atomic round trip, but a crash between the
//! two commands loses the payload: a relaxed-consistency trade-off of
//! non-native rotation, accepted here rather than papered over.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ExistenceCheck, SetExpiry, SetOptions};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::keygen;

use super::Backend;

/// Session storage backed by a networked Redis-compatible service.
///
/// Because expiration is enforced by the service's own TTL, an expired key
/// is indistinguishable from an absent one: lookups report
/// [`Error::NotFound`](crate::Error::NotFound), never
/// [`Error::Expired`](crate::Error::Expired).
pub struct ExternalCacheBackend {
    conn: MultiplexedConnection,
    key_length: usize,
    key_ttl: Duration,
}

impl ExternalCacheBackend {
    /// Connect to the service behind `client` and generate keys of
    /// `key_length` characters expiring after `key_ttl`.
    pub async fn connect(
        client: redis::Client,
        key_length: usize,
        key_ttl: Duration,
    ) -> Result<Self> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            key_length,
            key_ttl,
        })
    }

    /// Claim a fresh key for `payload` with a conditional write.
    ///
    /// `SET NX` only succeeds when the key is absent, so the collision
    /// retry works exactly like the in-memory entry loop, with atomicity
    /// delegated to the service.
    async fn insert_new(&self, payload: &[u8]) -> Result<String> {
        let mut conn = self.conn.clone();
        let ttl_ms = self.key_ttl.as_millis().max(1) as u64;

        loop {
            let key = keygen::generate(self.key_length)?;
            let options = SetOptions::default()
                .conditional_set(ExistenceCheck::NX)
                .with_expiration(SetExpiry::PX(ttl_ms));
            let stored: bool = conn.set_options(&key, payload, options).await?;
            if stored {
                return Ok(key);
            }
            debug!(key_length = self.key_length, "key collision, regenerating");
        }
    }
}

#[async_trait]
impl Backend for ExternalCacheBackend {
    async fn set(&self, payload: Bytes) -> Result<String> {
        if payload.is_empty() {
            return Err(Error::NilPayload);
        }
        self.insert_new(payload.as_ref()).await
    }

    async fn get_and_rotate(&self, key: &str) -> Result<(Bytes, String)> {
        let mut conn = self.conn.clone();

        // GETDEL consumes the key in one atomic round trip.
        let payload: Option<Vec<u8>> = conn.get_del(key).await?;
        let payload = payload.ok_or(Error::NotFound)?;

        let new_key = self.insert_new(&payload).await?;
        trace!(key, new_key = %new_key, "rotated session key");
        Ok((Bytes::from(payload), new_key))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn clear_expired(&self) -> Result<usize> {
        // The service expires keys on its own.
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    fn native_ttl(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIS_URL: &str = "redis://127.0.0.1:6379";

    async fn backend(key_ttl: Duration) -> ExternalCacheBackend {
        let client = redis::Client::open(REDIS_URL).unwrap();
        ExternalCacheBackend::connect(client, 32, key_ttl)
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_get_rotate_remove() {
        let backend = backend(Duration::from_secs(60)).await;

        let key = backend.set(Bytes::from_static(b"user-42")).await.unwrap();
        assert_eq!(key.len(), 32);

        let (payload, new_key) = backend.get_and_rotate(&key).await.unwrap();
        assert_eq!(payload, Bytes::from_static(b"user-42"));
        assert_ne!(new_key, key);

        // Old key was consumed.
        assert!(matches!(
            backend.get_and_rotate(&key).await,
            Err(Error::NotFound)
        ));

        backend.remove(&new_key).await.unwrap();
        backend.remove(&new_key).await.unwrap();
        assert!(matches!(
            backend.get_and_rotate(&new_key).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_native_ttl_expires_key() {
        let backend = backend(Duration::from_millis(50)).await;

        let key = backend.set(Bytes::from_static(b"ephemeral")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Native TTL reports expired keys as absent.
        assert!(matches!(
            backend.get_and_rotate(&key).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_empty_payload_rejected() {
        let backend = backend(Duration::from_secs(60)).await;
        assert!(matches!(
            backend.set(Bytes::new()).await,
            Err(Error::NilPayload)
        ));
    }
}
