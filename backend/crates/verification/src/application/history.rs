//! History and Timeline Use Cases
//!
//! Owner-only reads: past requests for an item, and the audit timeline of
//! a single request.

use kernel::id::{ItemId, UserId, VerificationRequestId};
use std::sync::Arc;

use crate::domain::entities::{VerificationLogEntry, VerificationRequest};
use crate::domain::repository::{
    ItemRepository, ItemStores, VerificationLogRepository, VerificationRequestRepository,
};
use crate::domain::value_objects::ItemKind;
use crate::error::{VerificationError, VerificationResult};

/// Item History Use Case
pub struct ItemHistoryUseCase<R, I>
where
    R: VerificationRequestRepository,
    I: ItemRepository,
{
    repo: Arc<R>,
    items: Arc<ItemStores<I>>,
}

impl<R, I> ItemHistoryUseCase<R, I>
where
    R: VerificationRequestRepository + Send + Sync,
    I: ItemRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>, items: Arc<ItemStores<I>>) -> Self {
        Self { repo, items }
    }

    /// Every request made for the item, newest first
    pub async fn execute(
        &self,
        requester_id: UserId,
        item_kind: ItemKind,
        item_id: ItemId,
    ) -> VerificationResult<Vec<VerificationRequest>> {
        self.items
            .get(item_kind)?
            .find_owned(item_id, requester_id)
            .await?
            .ok_or(VerificationError::ItemNotFound)?;

        self.repo.list_for_item(item_kind, item_id).await
    }
}

/// Request Timeline Use Case
pub struct RequestTimelineUseCase<R>
where
    R: VerificationRequestRepository + VerificationLogRepository,
{
    repo: Arc<R>,
}

impl<R> RequestTimelineUseCase<R>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Audit entries for a request the caller made, oldest first
    pub async fn execute(
        &self,
        requester_id: UserId,
        verification_id: VerificationRequestId,
    ) -> VerificationResult<Vec<VerificationLogEntry>> {
        let request = self
            .repo
            .find_by_id(verification_id)
            .await?
            .ok_or(VerificationError::RequestNotFound)?;

        if request.requester_id != requester_id {
            return Err(VerificationError::NotOwner);
        }

        self.repo.list_for_request(verification_id).await
    }
}
