//! Fire-and-forget notification dispatch
//!
//! Notifications run on their own task, bounded by a timeout, so a slow
//! or failing mail relay never delays or fails the caller's response.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::repository::{DecisionNotice, Notifier, VerificationRequestedNotice};

/// Ask the verifier for a decision in the background
pub fn dispatch_verification_requested<N>(
    notifier: Arc<N>,
    notice: VerificationRequestedNotice,
    timeout: Duration,
) where
    N: Notifier + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let outcome =
            tokio::time::timeout(timeout, notifier.send_verification_requested(&notice)).await;
        report("verification_requested", &notice.verifier_email, outcome);
    });
}

/// Tell the item owner about a decision in the background
pub fn dispatch_decision<N>(notifier: Arc<N>, notice: DecisionNotice, timeout: Duration)
where
    N: Notifier + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let outcome = tokio::time::timeout(timeout, notifier.send_decision(&notice)).await;
        report("decision", &notice.owner_email, outcome);
    });
}

fn report(kind: &'static str, to: &str, outcome: Result<bool, tokio::time::error::Elapsed>) {
    match outcome {
        Ok(true) => tracing::debug!(notification = kind, to = %to, "Notification sent"),
        Ok(false) => tracing::warn!(notification = kind, to = %to, "Notification failed"),
        Err(_) => tracing::warn!(notification = kind, to = %to, "Notification timed out"),
    }
}
