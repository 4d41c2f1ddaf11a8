//! Repository Traits
//!
//! Interfaces for data persistence and the external collaborators the
//! engine talks to. Implementations are in the infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::id::{ItemId, UserId, VerificationRequestId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{
    DecisionRecord, ItemSnapshot, UserProfile, VerificationLogEntry, VerificationRequest,
};
use crate::domain::value_objects::{Email, ItemKind, VerificationStatus};
use crate::error::{VerificationError, VerificationResult};

/// Result of an attempt to persist a new PENDING request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A live PENDING request already exists for the item; nothing written
    PendingExists,
    /// The token is already taken; nothing written
    TokenCollision,
}

/// Result of an attempt to decide a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecideOutcome {
    /// Request and item were updated together
    Decided(VerificationRequest),
    /// The request was not live at `now`; nothing written
    NotLive,
    /// The item behind the request no longer exists; nothing written
    ItemMissing,
}

/// Verification request repository trait
#[trait_variant::make(VerificationRequestRepository: Send)]
pub trait LocalVerificationRequestRepository {
    /// Insert `request` unless a live PENDING request exists for the same
    /// item. Check and insert are one atomic step.
    async fn create_pending(
        &self,
        request: &VerificationRequest,
        now: DateTime<Utc>,
    ) -> VerificationResult<CreateOutcome>;

    async fn find_by_token(&self, token: &str) -> VerificationResult<Option<VerificationRequest>>;

    async fn find_by_id(
        &self,
        id: VerificationRequestId,
    ) -> VerificationResult<Option<VerificationRequest>>;

    /// Apply a decision if and only if the request is still live at `now`.
    /// The request row and the item's verification columns change in one
    /// atomic step: approve sets `verified` with verifier metadata, reject
    /// records only who decided and their comment.
    async fn decide(
        &self,
        token: &str,
        decision: &DecisionRecord,
        now: DateTime<Utc>,
    ) -> VerificationResult<DecideOutcome>;

    /// Every request ever made for the item, newest first
    async fn list_for_item(
        &self,
        kind: ItemKind,
        item_id: ItemId,
    ) -> VerificationResult<Vec<VerificationRequest>>;

    /// Close live PENDING requests for the item by moving `expires_at` to
    /// `now`. Returns the requests that were closed.
    async fn expire_pending_for_item(
        &self,
        kind: ItemKind,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> VerificationResult<Vec<VerificationRequest>>;
}

/// Append-only audit log trait
#[trait_variant::make(VerificationLogRepository: Send)]
pub trait LocalVerificationLogRepository {
    async fn append(&self, entry: &VerificationLogEntry) -> VerificationResult<()>;

    /// Entries for one request, oldest first
    async fn list_for_request(
        &self,
        verification_id: VerificationRequestId,
    ) -> VerificationResult<Vec<VerificationLogEntry>>;
}

/// Per-kind item store, read side. Verification columns are only written
/// by [`LocalVerificationRequestRepository::decide`].
#[trait_variant::make(ItemRepository: Send)]
pub trait LocalItemRepository {
    /// Item if it exists and belongs to `owner_id`
    async fn find_owned(
        &self,
        item_id: ItemId,
        owner_id: UserId,
    ) -> VerificationResult<Option<ItemSnapshot>>;

    async fn find(&self, item_id: ItemId) -> VerificationResult<Option<ItemSnapshot>>;
}

/// Identity lookup trait
#[trait_variant::make(UserDirectory: Send)]
pub trait LocalUserDirectory {
    async fn find_by_email(&self, email: &Email) -> VerificationResult<Option<UserProfile>>;

    async fn find_by_id(&self, id: UserId) -> VerificationResult<Option<UserProfile>>;
}

// ============================================================================
// Notification gateway
// ============================================================================

/// Email to the verifier asking for a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequestedNotice {
    pub verifier_email: String,
    pub verifier_name: String,
    pub token: String,
    pub item_title: String,
    pub item_kind: ItemKind,
    pub requester_name: String,
    pub expires_at: DateTime<Utc>,
}

/// Email to the item owner once a decision is made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionNotice {
    pub owner_email: String,
    pub owner_name: String,
    pub item_title: String,
    pub item_kind: ItemKind,
    pub status: VerificationStatus,
    pub comment: Option<String>,
    pub actor_name: String,
}

/// Notification gateway trait.
///
/// Implementations must not fail: every error is caught internally and
/// reported as `false`, which the engine only logs.
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn send_verification_requested(&self, notice: &VerificationRequestedNotice) -> bool;

    async fn send_decision(&self, notice: &DecisionNotice) -> bool;
}

// ============================================================================
// Item kind routing
// ============================================================================

/// Maps each [`ItemKind`] to the repository that owns that kind of item.
pub struct ItemStores<S> {
    stores: HashMap<ItemKind, Arc<S>>,
}

impl<S> ItemStores<S> {
    pub fn new() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }

    /// Register (or replace) the store for `kind`
    pub fn with(mut self, kind: ItemKind, store: S) -> Self {
        self.stores.insert(kind, Arc::new(store));
        self
    }

    /// Store for `kind`; a missing registration is a wiring bug
    pub fn get(&self, kind: ItemKind) -> VerificationResult<&Arc<S>> {
        self.stores.get(&kind).ok_or_else(|| {
            VerificationError::Internal(format!("no item store registered for {kind}"))
        })
    }

    pub fn is_complete(&self) -> bool {
        ItemKind::ALL.iter().all(|kind| self.stores.contains_key(kind))
    }
}

impl<S> Default for ItemStores<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_stores_routing() {
        let stores = ItemStores::new()
            .with(ItemKind::Experience, "experiences")
            .with(ItemKind::Education, "educations");

        assert_eq!(**stores.get(ItemKind::Experience).unwrap(), "experiences");
        assert!(!stores.is_complete());
        assert!(matches!(
            stores.get(ItemKind::Project),
            Err(VerificationError::Internal(_))
        ));

        let stores = stores.with(ItemKind::Project, "projects");
        assert!(stores.is_complete());
    }
}
