//! Cryptographic utilities for invite tokens and shared-secret checks.

use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

/// Characters an invite token is drawn from (`[A-Za-z0-9_]`).
pub const TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_";

/// Generates a random token of `length` characters drawn from [`TOKEN_ALPHABET`].
///
/// Uses the operating system RNG, so tokens are unpredictable across calls
/// and processes.
pub fn generate_token(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Compares two secrets without short-circuiting on the first differing byte.
///
/// Both values are hashed first so the comparison length does not depend on
/// the input lengths.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_token_length() {
        assert_eq!(generate_token(10).len(), 10);
        assert_eq!(generate_token(1).len(), 1);
        assert!(generate_token(0).is_empty());
    }

    #[test]
    fn test_generate_token_alphabet() {
        let token = generate_token(500);
        for c in token.chars() {
            assert!(
                c.is_ascii_alphanumeric() || c == '_',
                "Invalid char in token: {}",
                c
            );
        }
    }

    #[test]
    fn test_generate_token_not_repeating() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_token(10)).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_token_alphabet_size() {
        assert_eq!(TOKEN_ALPHABET.len(), 63);
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3cret "));
        assert!(!secrets_match("", "s3cret"));
        assert!(secrets_match("", ""));
    }
}
