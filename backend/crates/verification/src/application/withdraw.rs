//! Withdraw Pending Use Case
//!
//! Lets the owner retract a live request, and lets item collaborators
//! close requests for an item that is being deleted. The request is
//! closed by expiring it now; no new status exists.

use kernel::id::{ItemId, UserId};
use std::sync::Arc;

use crate::application::audit::AuditTrail;
use crate::domain::entities::{LogMetadata, VerificationLogEntry};
use crate::domain::repository::{
    ItemRepository, ItemStores, UserDirectory, VerificationLogRepository,
    VerificationRequestRepository,
};
use crate::domain::services::Clock;
use crate::domain::value_objects::{ItemKind, LogAction};
use crate::error::{VerificationError, VerificationResult};

/// Withdraw Pending Use Case
pub struct WithdrawPendingUseCase<R, I, U>
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

impl<R, I, U> WithdrawPendingUseCase<R, I, U>
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

    /// Returns how many live requests were closed (0 or 1 in practice)
    pub async fn execute(
        &self,
        requester_id: UserId,
        item_kind: ItemKind,
        item_id: ItemId,
    ) -> VerificationResult<usize> {
        self.items
            .get(item_kind)?
            .find_owned(item_id, requester_id)
            .await?
            .ok_or(VerificationError::ItemNotFound)?;

        let requester = self
            .users
            .find_by_id(requester_id)
            .await?
            .ok_or(VerificationError::Unauthenticated)?;

        let now = self.clock.now();
        let closed = self
            .repo
            .expire_pending_for_item(item_kind, item_id, now)
            .await?;

        let audit = AuditTrail::new(self.repo.clone());
        for request in &closed {
            tracing::info!(
                verification_id = %request.id,
                item_kind = %item_kind,
                item_id = %item_id,
                "Verification request withdrawn"
            );
            audit
                .record(VerificationLogEntry::new(
                    request.id,
                    LogAction::Withdrawn,
                    requester.email.as_str(),
                    LogMetadata::new(),
                    now,
                ))
                .await;
        }

        Ok(closed.len())
    }
}
