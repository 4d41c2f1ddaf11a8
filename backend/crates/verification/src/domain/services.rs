//! Domain Services
//!
//! Token issuing and the notion of "now".

use chrono::{DateTime, Utc};

/// Source of the current instant. Expiry is always judged against this.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Issues the opaque credential carried in verification links
pub trait TokenIssuer: Send + Sync {
    fn issue(&self) -> String;
}

/// OS-random bytes, hex encoded (URL-safe, `2 * byte_len` characters).
///
/// Nothing about the item, the people involved or the time goes into a
/// token.
#[derive(Debug, Clone, Copy)]
pub struct RandomTokenIssuer {
    byte_len: usize,
}

impl RandomTokenIssuer {
    pub fn new(byte_len: usize) -> Self {
        Self { byte_len }
    }
}

impl TokenIssuer for RandomTokenIssuer {
    fn issue(&self) -> String {
        platform::crypto::random_hex_token(self.byte_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_shape() {
        let token = RandomTokenIssuer::new(32).issue();
        assert_eq!(token.len(), 64);
        assert!(token.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn test_ten_thousand_tokens_never_collide() {
        let issuer = RandomTokenIssuer::new(32);
        let tokens: HashSet<String> = (0..10_000).map(|_| issuer.issue()).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
