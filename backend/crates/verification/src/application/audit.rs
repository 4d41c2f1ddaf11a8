//! Audit Trail
//!
//! Best-effort writes to the verification log. A failed write never
//! fails the operation that produced it; it is reported as a data-quality
//! problem in the server logs instead.

use platform::client::ClientContext;
use std::sync::Arc;

use crate::domain::entities::{LogMetadata, VerificationLogEntry};
use crate::domain::repository::VerificationLogRepository;

pub struct AuditTrail<L>
where
    L: VerificationLogRepository,
{
    log_repo: Arc<L>,
}

impl<L> AuditTrail<L>
where
    L: VerificationLogRepository,
{
    pub fn new(log_repo: Arc<L>) -> Self {
        Self { log_repo }
    }

    /// Append `entry`, swallowing (and logging) any store failure.
    /// Returns whether the entry was written.
    pub async fn record(&self, entry: VerificationLogEntry) -> bool {
        match self.log_repo.append(&entry).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    verification_id = %entry.verification_id,
                    action = %entry.action,
                    "Audit log write failed, audit trail is incomplete"
                );
                false
            }
        }
    }
}

/// Metadata for token-facing actions: optional comment plus who was on
/// the other end of the link.
pub fn client_metadata(client: &ClientContext, comment: Option<&str>) -> LogMetadata {
    let mut metadata = LogMetadata::new();
    if let Some(comment) = comment {
        metadata.insert("comment".to_string(), comment.to_string());
    }
    if let Some(user_agent) = &client.user_agent {
        metadata.insert("userAgent".to_string(), user_agent.clone());
    }
    if let Some(ip) = client.ip_string() {
        metadata.insert("ip".to_string(), ip);
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_metadata_skips_absent_fields() {
        assert!(client_metadata(&ClientContext::default(), None).is_empty());

        let client = ClientContext::new(Some("10.0.0.7".parse().unwrap()), Some("UA/1".into()));
        let metadata = client_metadata(&client, Some("Great work"));
        assert_eq!(metadata.get("comment").map(String::as_str), Some("Great work"));
        assert_eq!(metadata.get("userAgent").map(String::as_str), Some("UA/1"));
        assert_eq!(metadata.get("ip").map(String::as_str), Some("10.0.0.7"));
    }
}
