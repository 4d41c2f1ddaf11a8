//! Review By Token Use Case
//!
//! What an unauthenticated verifier sees when opening a verification link.

use platform::client::ClientContext;
use std::sync::Arc;

use crate::application::audit::{AuditTrail, client_metadata};
use crate::domain::entities::{
    ItemSnapshot, UserProfile, VerificationLogEntry, VerificationRequest,
};
use crate::domain::repository::{
    ItemRepository, ItemStores, UserDirectory, VerificationLogRepository,
    VerificationRequestRepository,
};
use crate::domain::services::Clock;
use crate::domain::value_objects::{LogAction, RequestState};
use crate::error::{VerificationError, VerificationResult};

/// Output DTO for review by token
#[derive(Debug, Clone)]
pub struct ReviewOutput {
    pub request: VerificationRequest,
    pub state: RequestState,
    pub item: ItemSnapshot,
    pub student: Option<UserProfile>,
    pub verifier: Option<UserProfile>,
}

/// Review By Token Use Case
pub struct ReviewByTokenUseCase<R, I, U>
where
    R: VerificationRequestRepository + VerificationLogRepository,
    I: ItemRepository,
    U: UserDirectory,
{
    repo: Arc<R>,
    items: Arc<ItemStores<I>>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<R, I, U> ReviewByTokenUseCase<R, I, U>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync,
    I: ItemRepository + Send + Sync,
    U: UserDirectory + Send + Sync,
{
    pub fn new(
        repo: Arc<R>,
        items: Arc<ItemStores<I>>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            items,
            users,
            clock,
        }
    }

    /// Look up an unexpired request by token and record the view.
    ///
    /// A decided but unexpired request is still shown, with its decision.
    pub async fn execute(
        &self,
        token: &str,
        client: &ClientContext,
    ) -> VerificationResult<ReviewOutput> {
        let now = self.clock.now();

        let request = self
            .repo
            .find_by_token(token)
            .await?
            .ok_or(VerificationError::RequestNotFound)?;

        if request.is_expired(now) {
            return Err(VerificationError::RequestExpired);
        }

        let item = self
            .items
            .get(request.item_kind)?
            .find(request.item_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    verification_id = %request.id,
                    item_kind = %request.item_kind,
                    item_id = %request.item_id,
                    "Verification request points at a missing item"
                );
                VerificationError::OrphanedRequest
            })?;

        let student = self.users.find_by_id(request.requester_id).await?;
        let verifier = self.users.find_by_email(&request.verifier_email).await?;

        AuditTrail::new(self.repo.clone())
            .record(VerificationLogEntry::new(
                request.id,
                LogAction::Viewed,
                request.verifier_email.as_str(),
                client_metadata(client, None),
                now,
            ))
            .await;

        tracing::debug!(verification_id = %request.id, "Verification request viewed");

        Ok(ReviewOutput {
            state: request.state(now),
            request,
            item,
            student,
            verifier,
        })
    }
}
