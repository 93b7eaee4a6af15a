//! Invitation tokens.
//!
//! A token is 18 bytes from the operating system's CSPRNG encoded as
//! URL-safe base64 without padding, so it is always 24 characters drawn from
//! `[A-Za-z0-9_-]` and can be embedded in a join URL as is.

use core::fmt;

use base64::Engine as _;
use rand::{RngCore, rngs::OsRng};

const TOKEN_BYTES: usize = 18;

/// Length of every well-formed token.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 4 / 3;

/// Source of fresh invitation tokens.
pub trait TokenSource: fmt::Debug + Send + Sync {
    fn new_token(&self) -> String;
}

/// Tokens drawn from [`OsRng`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn new_token(&self) -> String {
        new_token()
    }
}

/// Generates a new random token.
pub fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Cheap shape check done before any store lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_tokens_are_well_formed() {
        for _ in 0..64 {
            let token = new_token();
            assert_eq!(token.len(), TOKEN_LEN);
            assert!(is_well_formed(&token), "{token}");
        }
    }

    #[test]
    fn generated_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..1000).map(|_| new_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"a".repeat(TOKEN_LEN + 1)));
        assert!(!is_well_formed(&format!("{}=", "a".repeat(TOKEN_LEN - 1))));
        assert!(!is_well_formed(&format!("{}/", "a".repeat(TOKEN_LEN - 1))));
        assert!(is_well_formed(&format!("{}-_", "a".repeat(TOKEN_LEN - 2))));
    }
}
