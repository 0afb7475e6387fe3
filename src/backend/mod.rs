//! Storage Backends
//!
//! Capability contract for session storage, with an in-memory variant and
//! a Redis adapter.

mod memory;
mod redis;

pub use memory::InMemoryBackend;
pub use redis::ExternalCacheBackend;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Capability contract every storage variant implements.
///
/// Implementations own their records exclusively; nothing outside the
/// backend mutates them. A record is only ever exposed as the payload
/// returned by a successful [`get_and_rotate`](Backend::get_and_rotate).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Store a payload under a freshly generated, collision-free key.
    ///
    /// Never overwrites a live record: candidate keys are inserted with
    /// check-and-set semantics and regenerated on collision. Fails with
    /// [`Error::NilPayload`](crate::Error::NilPayload) for an empty
    /// payload.
    async fn set(&self, payload: Bytes) -> Result<String>;

    /// Atomically consume the record at `key` and reissue it under a new
    /// key bound to the same payload.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) if no record
    /// exists, or [`Error::Expired`](crate::Error::Expired) if one exists
    /// past its TTL. An expired record is removed as a side effect; it is
    /// never returned nor left behind.
    async fn get_and_rotate(&self, key: &str) -> Result<(Bytes, String)>;

    /// Delete the record at `key` if present. Absent keys are not an
    /// error; removal is idempotent.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Evict every record whose expiration has passed, returning the
    /// count. A no-op returning 0 for backends with native TTL.
    async fn clear_expired(&self) -> Result<usize>;

    /// Delete every record, live or expired.
    async fn clear(&self) -> Result<()>;

    /// Whether the backing service expires records on its own. Backends
    /// with native TTL need no sweeper.
    fn native_ttl(&self) -> bool;
}
