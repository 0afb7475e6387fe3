//! Key Generation
//!
//! Uniform random key strings from the operating system's secure
//! randomness source.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

/// Characters used for generated keys. URL-safe alphanumeric; stable for a
/// given deployment, so keys can travel in cookies and query strings
/// without escaping. 62 characters gives ~5.95 bits of entropy per
/// character (~190 bits at the default length of 32).
pub const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest byte value usable without modulo bias: the greatest multiple of
/// the alphabet size that fits in a byte (62 * 4 = 248).
const REJECTION_LIMIT: u8 = (u8::MAX / KEY_ALPHABET.len() as u8) * KEY_ALPHABET.len() as u8;

/// Verify that the secure randomness source can actually be read.
///
/// Called once at store construction. A failure here is fatal for the
/// store: keys are the entire security boundary, and a general-purpose
/// PRNG is not an acceptable fallback.
pub fn probe_entropy() -> Result<()> {
    let mut buf = [0u8; 1];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| Error::RandomSourceUnavailable(e.to_string()))
}

/// Generate a random key of the given length from [`KEY_ALPHABET`].
///
/// Every character is drawn uniformly: raw bytes at or above the rejection
/// limit are discarded rather than folded with a biased modulo. A length
/// of 0 yields the empty string without touching the randomness source.
pub fn generate(length: usize) -> Result<String> {
    if length == 0 {
        return Ok(String::new());
    }

    let mut key = String::with_capacity(length);
    let mut buf = [0u8; 64];

    while key.len() < length {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| Error::RandomSourceUnavailable(e.to_string()))?;

        for &b in buf.iter() {
            if b < REJECTION_LIMIT {
                key.push(KEY_ALPHABET[(b % KEY_ALPHABET.len() as u8) as usize] as char);
                if key.len() == length {
                    break;
                }
            }
        }
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length_is_empty() {
        let key = generate(0).unwrap();
        assert_eq!(key, "");
    }

    #[test]
    fn test_generated_length() {
        for len in [1, 10, 32, 64, 4096] {
            let key = generate(len).unwrap();
            assert_eq!(key.len(), len);
        }
    }

    #[test]
    fn test_only_alphabet_characters() {
        let key = generate(1024).unwrap();
        assert!(key.bytes().all(|b| KEY_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_keys_differ() {
        let a = generate(32).unwrap();
        let b = generate(32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_probe_entropy() {
        assert!(probe_entropy().is_ok());
    }

    #[test]
    fn test_rejection_limit_is_unbiased() {
        // 248 = 62 * 4; every alphabet index maps from exactly 4 bytes.
        assert_eq!(REJECTION_LIMIT as usize % KEY_ALPHABET.len(), 0);
    }
}
