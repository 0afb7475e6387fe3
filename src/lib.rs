//! ROTAKEY - Single-Use Rotating Session Keys
//!
//! Server-side session management built on single-use keys: every
//! successful read atomically invalidates the presented key and mints a
//! fresh one bound to the same payload, and unused keys expire after a
//! configurable TTL.
//!
//! Sessions live in an in-memory concurrent map by default, or in a
//! Redis-compatible service when a client is supplied. In-memory session
//! data is lost as soon as the process stops.
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use rotakey::{SessionStore, StoreOptions};
//!
//! # async fn demo() -> rotakey::Result<()> {
//! let store = SessionStore::new(StoreOptions::new()).await?;
//!
//! let key = store.set(Bytes::from_static(b"user-42")).await?;
//! let (payload, new_key) = store.get(&key).await?;
//! assert_eq!(payload, Bytes::from_static(b"user-42"));
//!
//! // `key` was consumed; only `new_key` is valid now.
//! store.remove(&new_key).await?;
//! store.destroy().await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod keygen;
pub mod store;

mod sweeper;

pub use backend::{Backend, ExternalCacheBackend, InMemoryBackend};
pub use config::StoreOptions;
pub use error::{ConfigError, ConfigErrors, Error, Result};
pub use store::SessionStore;
