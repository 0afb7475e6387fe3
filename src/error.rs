//! Error Types
//!
//! Store-level failures and construction-time configuration errors.

/// A single invalid or conflicting configuration option.
///
/// Construction collects every violation instead of failing on the first
/// one, so each variant names exactly one problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A Redis client was already registered for this store.
    #[error("a Redis client was already registered for this store")]
    RedisClientAlreadySet,

    /// A custom key length was already registered for this store.
    #[error("a custom key length was already registered for this store")]
    KeyLengthAlreadySet,

    /// Key length must be at least 1.
    #[error("key length must be at least 1")]
    ZeroKeyLength,

    /// A custom key TTL was already registered for this store.
    #[error("a custom key TTL was already registered for this store")]
    KeyTtlAlreadySet,

    /// Key TTL must be a positive duration.
    #[error("key TTL must be a positive duration")]
    ZeroKeyTtl,

    /// Auto-clear of expired keys was already enabled for this store.
    #[error("auto-clear of expired keys was already enabled for this store")]
    AutoClearAlreadySet,
}

/// Aggregate of every configuration violation found at construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid store configuration: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ConfigErrors(pub Vec<ConfigError>);

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No live record exists for the given key. The key may never have
    /// existed, or it was already consumed or removed.
    #[error("no value was found with the given key")]
    NotFound,

    /// A record existed for the key but its TTL has passed. The record is
    /// removed as a side effect; it is never returned.
    #[error("the key has expired")]
    Expired,

    /// `set` was called with an empty payload.
    #[error("the payload is empty")]
    NilPayload,

    /// The operating system's secure randomness source could not be read.
    /// A store cannot operate safely without it; treat as fatal.
    #[error("secure randomness source unavailable: {0}")]
    RandomSourceUnavailable(String),

    /// I/O failure from the external cache backend, surfaced verbatim.
    #[error("backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// One or more invalid configuration options, reported together.
    #[error(transparent)]
    Config(#[from] ConfigErrors),
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_display_joins_all() {
        let errs = ConfigErrors(vec![ConfigError::ZeroKeyLength, ConfigError::ZeroKeyTtl]);
        let msg = errs.to_string();
        assert!(msg.contains("key length must be at least 1"));
        assert!(msg.contains("key TTL must be a positive duration"));
        assert!(msg.contains("; "));
    }

    #[test]
    fn test_not_found_and_expired_are_distinct() {
        assert_ne!(Error::NotFound.to_string(), Error::Expired.to_string());
    }
}
