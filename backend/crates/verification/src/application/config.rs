//! Application Configuration
//!
//! Configuration for the verification application layer.

use std::time::Duration;

/// Verification application configuration
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Lifetime of a verification link
    pub token_ttl: Duration,
    /// Random bytes per token (hex doubles the length)
    pub token_bytes: usize,
    /// Fresh tokens tried before giving up on a unique one
    pub max_token_attempts: u32,
    /// Prefix of `{frontend}/verify/{token}` links
    pub frontend_base_url: String,
    /// Upper bound on a single notification dispatch
    pub notification_timeout: Duration,
    /// Longest accepted verifier comment, in characters
    pub max_comment_len: usize,
    /// Header carrying the authenticated user id
    pub identity_header: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(72 * 3600),
            token_bytes: 32,
            max_token_attempts: 3,
            frontend_base_url: "https://portfolio.example".to_string(),
            notification_timeout: Duration::from_secs(10),
            max_comment_len: 2000,
            identity_header: "x-user-id".to_string(),
        }
    }
}

impl VerificationConfig {
    /// Create config for development (local frontend)
    pub fn development() -> Self {
        Self {
            frontend_base_url: "http://localhost:5173".to_string(),
            ..Default::default()
        }
    }

    pub fn with_frontend_base_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn token_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.token_ttl).unwrap_or_else(|_| chrono::Duration::hours(72))
    }

    /// Link a verifier follows to review a request
    pub fn verification_link(&self, token: &str) -> String {
        format!(
            "{}/verify/{}",
            self.frontend_base_url.trim_end_matches('/'),
            token
        )
    }
}
