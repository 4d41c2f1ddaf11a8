//! Outbound Mail Transport
//!
//! Delivery of already-rendered messages. Templates and the decision of
//! what to send live with the domain that sends them.

use serde::Serialize;
use std::time::Duration;

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Mail delivery failure
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail relay rejected message with status {0}")]
    Rejected(u16),
}

/// Mail transport trait
#[trait_variant::make(MailTransport: Send)]
pub trait LocalMailTransport {
    /// Hand a message to the transport. `Ok` means accepted, not delivered.
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

// ============================================================================
// HTTP relay
// ============================================================================

/// Wire format expected by the mail relay
#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Sends mail by POSTing JSON to an HTTP mail relay (bearer-key auth).
#[derive(Clone)]
pub struct HttpMailTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailTransport {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let payload = RelayPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected(status.as_u16()));
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "Mail accepted by relay");
        Ok(())
    }
}

// ============================================================================
// Log only (development)
// ============================================================================

/// Logs messages instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogMailTransport;

impl MailTransport for LogMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "Mail not sent (log transport)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> MailMessage {
        MailMessage {
            to: "verifier@mit.edu".to_string(),
            subject: "Hello".to_string(),
            text: "plain".to_string(),
            html: "<p>plain</p>".to_string(),
        }
    }

    #[test]
    fn test_log_transport_accepts() {
        let result = tokio_test::block_on(MailTransport::send(&LogMailTransport, &message()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_relay_payload_shape() {
        let msg = message();
        let payload = RelayPayload {
            from: "noreply@portfolio.example",
            to: &msg.to,
            subject: &msg.subject,
            text: &msg.text,
            html: &msg.html,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["from"], "noreply@portfolio.example");
        assert_eq!(json["to"], "verifier@mit.edu");
        assert_eq!(json["html"], "<p>plain</p>");
    }

    #[test]
    fn test_http_transport_builds() {
        let transport = HttpMailTransport::new(
            "http://localhost:9/send",
            "key",
            "noreply@portfolio.example",
            Duration::from_secs(5),
        );
        assert!(transport.is_ok());
    }
}
