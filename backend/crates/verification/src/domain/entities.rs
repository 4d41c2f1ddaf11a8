//! Domain Entities
//!
//! Core business entities for the verification domain.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{ItemId, UserId, VerificationLogId, VerificationRequestId};
use std::collections::BTreeMap;

use crate::domain::value_objects::{
    Email, ItemKind, LogAction, RequestState, UserRole, VerificationStatus,
};

/// VerificationRequest entity - one attempt to get an item verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub id: VerificationRequestId,
    pub item_kind: ItemKind,
    pub item_id: ItemId,
    /// Owner of the item at creation time
    pub requester_id: UserId,
    pub verifier_email: Email,
    /// Sole credential for the unauthenticated decision link
    pub token: String,
    pub status: VerificationStatus,
    pub comment: Option<String>,
    pub acted_by: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationRequest {
    /// Create a new PENDING request expiring `ttl` after `now`
    pub fn new(
        item_kind: ItemKind,
        item_id: ItemId,
        requester_id: UserId,
        verifier_email: Email,
        token: String,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            id: VerificationRequestId::new(),
            item_kind,
            item_id,
            requester_id,
            verifier_email,
            token,
            status: VerificationStatus::Pending,
            comment: None,
            acted_by: None,
            acted_at: None,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    /// Expired at `now`, whatever the stored status says
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// PENDING and not yet expired: the only state a decision may act on
    #[inline]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == VerificationStatus::Pending && !self.is_expired(now)
    }

    pub fn state(&self, now: DateTime<Utc>) -> RequestState {
        if self.status == VerificationStatus::Pending && self.is_expired(now) {
            RequestState::Expired
        } else {
            self.status.into()
        }
    }
}

/// Terminal values written by a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRecord {
    pub status: VerificationStatus,
    pub acted_by: Email,
    pub comment: Option<String>,
    pub acted_at: DateTime<Utc>,
}

/// Free-form audit context (comment, user agent, client ip, ...)
pub type LogMetadata = BTreeMap<String, String>;

/// VerificationLogEntry entity - append-only audit record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationLogEntry {
    pub id: VerificationLogId,
    pub verification_id: VerificationRequestId,
    pub action: LogAction,
    pub actor_email: String,
    pub metadata: LogMetadata,
    pub created_at: DateTime<Utc>,
}

impl VerificationLogEntry {
    pub fn new(
        verification_id: VerificationRequestId,
        action: LogAction,
        actor_email: impl Into<String>,
        metadata: LogMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: VerificationLogId::new(),
            verification_id,
            action,
            actor_email: actor_email.into(),
            metadata,
            created_at: now,
        }
    }
}

/// What the engine can see of an Experience, Education or Project.
///
/// Field names are kind-neutral: `title` is the role, degree or project
/// name and `subtitle` the organization, institution or repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub kind: ItemKind,
    pub id: ItemId,
    pub owner_id: UserId,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub attachments: Vec<String>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub verifier_comment: Option<String>,
}

/// User as resolved by the identity lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    pub institute: Option<String>,
}

impl UserProfile {
    /// Name for greetings, falling back to the email address
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            self.email.as_str()
        } else {
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(now: DateTime<Utc>) -> VerificationRequest {
        VerificationRequest::new(
            ItemKind::Experience,
            ItemId::new(),
            UserId::new(),
            Email::from_db("v@mit.edu"),
            "ab".repeat(32),
            now,
            Duration::hours(72),
        )
    }

    #[test]
    fn test_new_request_is_pending_for_ttl() {
        let now = Utc::now();
        let req = request(now);
        assert_eq!(req.status, VerificationStatus::Pending);
        assert_eq!(req.expires_at - req.created_at, Duration::hours(72));
        assert!(req.is_live(now));
        assert!(req.is_live(now + Duration::hours(71)));
        assert!(!req.is_live(now + Duration::hours(72)));
        assert!(req.acted_by.is_none() && req.acted_at.is_none() && req.comment.is_none());
    }

    #[test]
    fn test_state_expiry_overrides_pending_only() {
        let now = Utc::now();
        let mut req = request(now);
        let later = now + Duration::hours(73);
        assert_eq!(req.state(now), RequestState::Pending);
        assert_eq!(req.state(later), RequestState::Expired);

        req.status = VerificationStatus::Approved;
        assert_eq!(req.state(later), RequestState::Approved);
        assert!(!req.is_live(now));
    }

    #[test]
    fn test_display_name_fallback() {
        let mut user = UserProfile {
            id: UserId::new(),
            email: Email::from_db("s@mit.edu"),
            name: "  ".to_string(),
            role: UserRole::Student,
            institute: None,
        };
        assert_eq!(user.display_name(), "s@mit.edu");
        user.name = "Sam".to_string();
        assert_eq!(user.display_name(), "Sam");
    }
}
