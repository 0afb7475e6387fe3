//! Store Configuration
//!
//! Builder-style options validated once at store construction. Violations
//! are collected and reported together rather than failing on the first
//! one, so a misconfigured deployment sees every problem at once.

use std::time::Duration;

use crate::error::{ConfigError, ConfigErrors};

/// Default length of generated keys (~190 bits of entropy).
pub const DEFAULT_KEY_LENGTH: usize = 32;

/// Default time-to-live for unused keys.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(600);

/// Options for building a [`SessionStore`](crate::SessionStore).
///
/// Each `with_*` call registers an option at most once; a second call of
/// the same kind is recorded as a configuration error instead of silently
/// overwriting the first.
#[derive(Debug, Default)]
pub struct StoreOptions {
    key_length: Option<usize>,
    key_ttl: Option<Duration>,
    auto_clear_expired: bool,
    auto_clear_seen: bool,
    redis_client: Option<redis::Client>,
    errors: Vec<ConfigError>,
}

impl StoreOptions {
    /// Create an empty option set. Unset options fall back to defaults:
    /// key length 32, TTL 10 minutes, auto-clear off, in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom length for generated keys. Must be at least 1.
    pub fn with_key_length(mut self, key_length: usize) -> Self {
        if self.key_length.is_some() {
            self.errors.push(ConfigError::KeyLengthAlreadySet);
            return self;
        }
        if key_length == 0 {
            self.errors.push(ConfigError::ZeroKeyLength);
            return self;
        }
        self.key_length = Some(key_length);
        self
    }

    /// Set a custom time-to-live for generated keys. Must be positive.
    pub fn with_key_ttl(mut self, key_ttl: Duration) -> Self {
        if self.key_ttl.is_some() {
            self.errors.push(ConfigError::KeyTtlAlreadySet);
            return self;
        }
        if key_ttl.is_zero() {
            self.errors.push(ConfigError::ZeroKeyTtl);
            return self;
        }
        self.key_ttl = Some(key_ttl);
        self
    }

    /// Store sessions in the Redis-compatible service behind `client`
    /// instead of in process memory. Expiration is then enforced by the
    /// service's native TTL.
    pub fn with_redis(mut self, client: redis::Client) -> Self {
        if self.redis_client.is_some() {
            self.errors.push(ConfigError::RedisClientAlreadySet);
            return self;
        }
        self.redis_client = Some(client);
        self
    }

    /// Periodically evict expired keys in the background. The sweep
    /// interval equals the configured key TTL. Only meaningful for the
    /// in-memory backend; a native-TTL backend expires keys on its own.
    pub fn with_auto_clear_expired(mut self) -> Self {
        if self.auto_clear_seen {
            self.errors.push(ConfigError::AutoClearAlreadySet);
            return self;
        }
        self.auto_clear_seen = true;
        self.auto_clear_expired = true;
        self
    }

    /// Validate and resolve into a concrete configuration, reporting every
    /// violation together.
    pub(crate) fn resolve(self) -> Result<ResolvedConfig, ConfigErrors> {
        if !self.errors.is_empty() {
            return Err(ConfigErrors(self.errors));
        }

        Ok(ResolvedConfig {
            key_length: self.key_length.unwrap_or(DEFAULT_KEY_LENGTH),
            key_ttl: self.key_ttl.unwrap_or(DEFAULT_KEY_TTL),
            auto_clear_expired: self.auto_clear_expired,
            redis_client: self.redis_client,
        })
    }
}

/// Configuration after validation and default resolution.
#[derive(Debug)]
pub(crate) struct ResolvedConfig {
    pub key_length: usize,
    pub key_ttl: Duration,
    pub auto_clear_expired: bool,
    pub redis_client: Option<redis::Client>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = StoreOptions::new().resolve().unwrap();
        assert_eq!(cfg.key_length, DEFAULT_KEY_LENGTH);
        assert_eq!(cfg.key_ttl, DEFAULT_KEY_TTL);
        assert!(!cfg.auto_clear_expired);
        assert!(cfg.redis_client.is_none());
    }

    #[test]
    fn test_custom_options() {
        let cfg = StoreOptions::new()
            .with_key_length(64)
            .with_key_ttl(Duration::from_secs(30))
            .with_auto_clear_expired()
            .resolve()
            .unwrap();
        assert_eq!(cfg.key_length, 64);
        assert_eq!(cfg.key_ttl, Duration::from_secs(30));
        assert!(cfg.auto_clear_expired);
    }

    #[test]
    fn test_duplicate_options_are_distinct_errors() {
        let err = StoreOptions::new()
            .with_key_length(16)
            .with_key_length(64)
            .with_key_ttl(Duration::from_secs(1))
            .with_key_ttl(Duration::from_secs(2))
            .with_auto_clear_expired()
            .with_auto_clear_expired()
            .resolve()
            .unwrap_err();

        assert_eq!(
            err.0,
            vec![
                ConfigError::KeyLengthAlreadySet,
                ConfigError::KeyTtlAlreadySet,
                ConfigError::AutoClearAlreadySet,
            ]
        );
    }

    #[test]
    fn test_invalid_values_aggregate() {
        let err = StoreOptions::new()
            .with_key_length(0)
            .with_key_ttl(Duration::ZERO)
            .resolve()
            .unwrap_err();

        assert_eq!(
            err.0,
            vec![ConfigError::ZeroKeyLength, ConfigError::ZeroKeyTtl]
        );
    }

    #[test]
    fn test_duplicate_redis_client() {
        let a = redis::Client::open("redis://127.0.0.1:6379").unwrap();
        let b = redis::Client::open("redis://127.0.0.1:6380").unwrap();
        let err = StoreOptions::new()
            .with_redis(a)
            .with_redis(b)
            .resolve()
            .unwrap_err();

        assert_eq!(err.0, vec![ConfigError::RedisClientAlreadySet]);
    }
}
