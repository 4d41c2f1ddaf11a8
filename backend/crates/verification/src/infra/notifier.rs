//! Email notifier
//!
//! Notification gateway backed by a [`MailTransport`]. Delivery failures
//! are logged and reported as `false`; nothing is ever propagated.

use platform::mail::{MailMessage, MailTransport};
use std::sync::Arc;

use crate::application::config::VerificationConfig;
use crate::domain::repository::{DecisionNotice, Notifier, VerificationRequestedNotice};
use crate::infra::templates;

pub struct EmailNotifier<T>
where
    T: MailTransport,
{
    transport: T,
    config: Arc<VerificationConfig>,
}

impl<T> EmailNotifier<T>
where
    T: MailTransport + Send + Sync,
{
    pub fn new(transport: T, config: Arc<VerificationConfig>) -> Self {
        Self { transport, config }
    }

    async fn deliver(&self, message: MailMessage) -> bool {
        match self.transport.send(&message).await {
            Ok(()) => {
                tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, to = %message.to, "Email delivery failed");
                false
            }
        }
    }
}

impl<T> Notifier for EmailNotifier<T>
where
    T: MailTransport + Send + Sync,
{
    async fn send_verification_requested(&self, notice: &VerificationRequestedNotice) -> bool {
        let link = self.config.verification_link(&notice.token);
        self.deliver(templates::verification_requested(notice, &link))
            .await
    }

    async fn send_decision(&self, notice: &DecisionNotice) -> bool {
        self.deliver(templates::decision(notice)).await
    }
}
