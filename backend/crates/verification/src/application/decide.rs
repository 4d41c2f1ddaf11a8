//! Decide Use Case (approve / reject)

use chrono::{DateTime, Utc};
use kernel::id::VerificationRequestId;
use platform::client::ClientContext;
use std::sync::Arc;

use crate::application::audit::{AuditTrail, client_metadata};
use crate::application::config::VerificationConfig;
use crate::application::dispatch::dispatch_decision;
use crate::domain::entities::{DecisionRecord, VerificationLogEntry, VerificationRequest};
use crate::domain::repository::{
    DecideOutcome, DecisionNotice, ItemRepository, ItemStores, Notifier, UserDirectory,
    VerificationLogRepository, VerificationRequestRepository,
};
use crate::domain::services::Clock;
use crate::domain::value_objects::{
    Decision, Email, VerificationStatus, normalize_comment,
};
use crate::error::{VerificationError, VerificationResult};

/// Input DTO for a decision
#[derive(Debug, Clone)]
pub struct DecideInput {
    pub token: String,
    pub decision: Decision,
    pub actor_email: String,
    pub comment: Option<String>,
}

/// Output DTO for a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecideOutput {
    pub verification_id: VerificationRequestId,
    pub status: VerificationStatus,
}

/// Decide Use Case
pub struct DecideUseCase<R, I, U, N>
where
    R: VerificationRequestRepository + VerificationLogRepository,
    I: ItemRepository,
    U: UserDirectory,
    N: Notifier,
{
    repo: Arc<R>,
    items: Arc<ItemStores<I>>,
    users: Arc<U>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    config: Arc<VerificationConfig>,
}

impl<R, I, U, N> DecideUseCase<R, I, U, N>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync,
    I: ItemRepository + Send + Sync,
    U: UserDirectory + Send + Sync,
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(
        repo: Arc<R>,
        items: Arc<ItemStores<I>>,
        users: Arc<U>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
        config: Arc<VerificationConfig>,
    ) -> Self {
        Self {
            repo,
            items,
            users,
            notifier,
            clock,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: DecideInput,
        client: &ClientContext,
    ) -> VerificationResult<DecideOutput> {
        let actor = Email::parse(&input.actor_email, "actorEmail")?;
        let comment = normalize_comment(input.comment, self.config.max_comment_len)?;
        let now = self.clock.now();

        let request = self.repo.find_by_token(&input.token).await?;
        let request = match request {
            Some(r) if r.is_live(now) => r,
            other => return Err(dead_request_error(other.as_ref(), now)),
        };

        let item = self
            .items
            .get(request.item_kind)?
            .find(request.item_id)
            .await?
            .ok_or_else(|| orphaned(&request))?;

        let record = DecisionRecord {
            status: input.decision.status(),
            acted_by: actor.clone(),
            comment: comment.clone(),
            acted_at: now,
        };

        // Conditional update: only one concurrent decision can win. The item
        // is marked in the same step or not at all.
        let decided = match self.repo.decide(&input.token, &record, now).await? {
            DecideOutcome::Decided(decided) => decided,
            DecideOutcome::NotLive => {
                let current = self.repo.find_by_token(&input.token).await?;
                let err = dead_request_error(current.as_ref(), now);
                tracing::info!(verification_id = %request.id, cause = %err, "Lost decision race");
                return Err(err);
            }
            DecideOutcome::ItemMissing => return Err(orphaned(&request)),
        };

        tracing::info!(
            verification_id = %decided.id,
            item_kind = %decided.item_kind,
            item_id = %decided.item_id,
            status = %decided.status,
            "Verification decided"
        );

        AuditTrail::new(self.repo.clone())
            .record(VerificationLogEntry::new(
                decided.id,
                input.decision.log_action(),
                actor.as_str(),
                client_metadata(client, comment.as_deref()),
                now,
            ))
            .await;

        self.notify_owner(&decided, &item.title, &actor).await;

        Ok(DecideOutput {
            verification_id: decided.id,
            status: decided.status,
        })
    }

    async fn notify_owner(&self, decided: &VerificationRequest, item_title: &str, actor: &Email) {
        let owner = match self.users.find_by_id(decided.requester_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                tracing::warn!(verification_id = %decided.id, "Item owner not found, decision not sent");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, verification_id = %decided.id, "Owner lookup failed, decision not sent");
                return;
            }
        };

        let actor_name = match self.users.find_by_email(actor).await {
            Ok(Some(user)) => user.display_name().to_string(),
            _ => actor.to_string(),
        };

        dispatch_decision(
            self.notifier.clone(),
            DecisionNotice {
                owner_email: owner.email.to_string(),
                owner_name: owner.display_name().to_string(),
                item_title: item_title.to_string(),
                item_kind: decided.item_kind,
                status: decided.status,
                comment: decided.comment.clone(),
                actor_name,
            },
            self.config.notification_timeout,
        );
    }
}

fn orphaned(request: &VerificationRequest) -> VerificationError {
    tracing::warn!(
        verification_id = %request.id,
        item_kind = %request.item_kind,
        item_id = %request.item_id,
        "Decision on a request whose item no longer exists"
    );
    VerificationError::OrphanedRequest
}

/// Internal cause for a token that cannot be acted on. All of them render
/// the same to the caller.
fn dead_request_error(
    request: Option<&VerificationRequest>,
    now: DateTime<Utc>,
) -> VerificationError {
    match request {
        None => VerificationError::RequestNotFound,
        Some(r) if r.status.is_terminal() => VerificationError::AlreadyDecided,
        Some(r) if r.is_expired(now) => VerificationError::RequestExpired,
        // Still live on re-read: the conditional update lost to nothing we
        // can see, so treat it as decided elsewhere.
        Some(_) => VerificationError::AlreadyDecided,
    }
}
