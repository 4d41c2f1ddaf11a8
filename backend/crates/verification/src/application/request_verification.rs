//! Request Verification Use Case

use kernel::id::{ItemId, UserId};
use std::sync::Arc;

use crate::application::audit::AuditTrail;
use crate::application::config::VerificationConfig;
use crate::application::dispatch::dispatch_verification_requested;
use crate::domain::entities::{LogMetadata, VerificationLogEntry, VerificationRequest};
use crate::domain::repository::{
    CreateOutcome, ItemRepository, ItemStores, Notifier, UserDirectory,
    VerificationLogRepository, VerificationRequestRepository, VerificationRequestedNotice,
};
use crate::domain::services::{Clock, TokenIssuer};
use crate::domain::value_objects::{Email, ItemKind, LogAction, institutes_match};
use crate::error::{VerificationError, VerificationResult};

/// Input DTO for request verification
#[derive(Debug, Clone)]
pub struct RequestVerificationInput {
    pub requester_id: UserId,
    pub item_kind: ItemKind,
    pub item_id: ItemId,
    pub verifier_email: String,
}

/// Request Verification Use Case
pub struct RequestVerificationUseCase<R, I, U, N>
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
    tokens: Arc<dyn TokenIssuer>,
    config: Arc<VerificationConfig>,
}

impl<R, I, U, N> RequestVerificationUseCase<R, I, U, N>
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
        tokens: Arc<dyn TokenIssuer>,
        config: Arc<VerificationConfig>,
    ) -> Self {
        Self {
            repo,
            items,
            users,
            notifier,
            clock,
            tokens,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: RequestVerificationInput,
    ) -> VerificationResult<VerificationRequest> {
        let verifier_email = Email::parse(&input.verifier_email, "verifierEmail")?;

        let item = self
            .items
            .get(input.item_kind)?
            .find_owned(input.item_id, input.requester_id)
            .await?
            .ok_or(VerificationError::ItemNotFound)?;

        if item.verified {
            return Err(VerificationError::AlreadyVerified);
        }

        let requester = self
            .users
            .find_by_id(input.requester_id)
            .await?
            .ok_or(VerificationError::Unauthenticated)?;

        let verifier = self
            .users
            .find_by_email(&verifier_email)
            .await?
            .ok_or(VerificationError::VerifierNotFound)?;

        if verifier.id == requester.id {
            return Err(VerificationError::SelfVerification);
        }
        if !verifier.role.can_verify() {
            return Err(VerificationError::NotAVerifier);
        }

        match institutes_match(requester.institute.as_deref(), verifier.institute.as_deref()) {
            None => return Err(VerificationError::InstituteMissing),
            Some(false) => {
                tracing::warn!(
                    requester_id = %requester.id,
                    verifier_id = %verifier.id,
                    "Verifier institute does not match requester"
                );
                return Err(VerificationError::InstituteMismatch);
            }
            Some(true) => {}
        }

        let request = self.insert_pending(&input, verifier_email).await?;

        tracing::info!(
            verification_id = %request.id,
            item_kind = %request.item_kind,
            item_id = %request.item_id,
            expires_at = %request.expires_at,
            "Verification requested"
        );

        let mut metadata = LogMetadata::new();
        metadata.insert(
            "verifierEmail".to_string(),
            request.verifier_email.to_string(),
        );
        AuditTrail::new(self.repo.clone())
            .record(VerificationLogEntry::new(
                request.id,
                LogAction::Created,
                requester.email.as_str(),
                metadata,
                request.created_at,
            ))
            .await;

        dispatch_verification_requested(
            self.notifier.clone(),
            VerificationRequestedNotice {
                verifier_email: verifier.email.to_string(),
                verifier_name: verifier.display_name().to_string(),
                token: request.token.clone(),
                item_title: item.title.clone(),
                item_kind: item.kind,
                requester_name: requester.display_name().to_string(),
                expires_at: request.expires_at,
            },
            self.config.notification_timeout,
        );

        Ok(request)
    }

    /// Persist a new PENDING request, reissuing the token on collision
    async fn insert_pending(
        &self,
        input: &RequestVerificationInput,
        verifier_email: Email,
    ) -> VerificationResult<VerificationRequest> {
        for attempt in 1..=self.config.max_token_attempts {
            let now = self.clock.now();
            let request = VerificationRequest::new(
                input.item_kind,
                input.item_id,
                input.requester_id,
                verifier_email.clone(),
                self.tokens.issue(),
                now,
                self.config.token_ttl_chrono(),
            );

            match self.repo.create_pending(&request, now).await? {
                CreateOutcome::Created => return Ok(request),
                CreateOutcome::PendingExists => {
                    tracing::debug!(
                        item_kind = %input.item_kind,
                        item_id = %input.item_id,
                        "Verification already pending"
                    );
                    return Err(VerificationError::PendingRequestExists);
                }
                CreateOutcome::TokenCollision => {
                    tracing::warn!(attempt, "Verification token collision, reissuing");
                }
            }
        }

        Err(VerificationError::Internal(format!(
            "no unique verification token after {} attempts",
            self.config.max_token_attempts
        )))
    }
}
