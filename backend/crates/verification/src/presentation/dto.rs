//! API DTOs (Data Transfer Objects)
//!
//! Tokens never appear in any response: the verifier receives theirs by
//! email and the requester has no use for it.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{ItemId, VerificationRequestId};
use serde::{Deserialize, Serialize};

use crate::application::review::ReviewOutput;
use crate::domain::entities::{
    ItemSnapshot, LogMetadata, UserProfile, VerificationLogEntry, VerificationRequest,
};
use crate::domain::value_objects::{ItemKind, LogAction, RequestState, VerificationStatus};

/// Request for POST /requests
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub item_kind: String,
    pub item_id: String,
    #[serde(default)]
    pub verifier_email: String,
}

/// Request for POST /token/{token}/approve and /reject
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBody {
    #[serde(default)]
    pub actor_email: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Response for POST /requests
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCreatedResponse {
    pub id: VerificationRequestId,
    pub status: VerificationStatus,
    pub item_kind: ItemKind,
    pub item_id: ItemId,
    pub verifier_email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&VerificationRequest> for RequestCreatedResponse {
    fn from(r: &VerificationRequest) -> Self {
        Self {
            id: r.id,
            status: r.status,
            item_kind: r.item_kind,
            item_id: r.item_id,
            verifier_email: r.verifier_email.to_string(),
            expires_at: r.expires_at,
            created_at: r.created_at,
        }
    }
}

/// One past request in an item's history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub id: VerificationRequestId,
    pub item_kind: ItemKind,
    pub item_id: ItemId,
    pub verifier_email: String,
    pub status: RequestState,
    pub comment: Option<String>,
    pub acted_by: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RequestSummary {
    pub fn from_entity(r: &VerificationRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: r.id,
            item_kind: r.item_kind,
            item_id: r.item_id,
            verifier_email: r.verifier_email.to_string(),
            status: r.state(now),
            comment: r.comment.clone(),
            acted_by: r.acted_by.clone(),
            acted_at: r.acted_at,
            expires_at: r.expires_at,
            created_at: r.created_at,
        }
    }
}

/// Response for GET /items/{kind}/{id}/history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub requests: Vec<RequestSummary>,
}

/// Item fields a verifier needs to decide
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub kind: ItemKind,
    pub id: ItemId,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub attachments: Vec<String>,
    pub verified: bool,
}

impl From<ItemSnapshot> for ItemView {
    fn from(item: ItemSnapshot) -> Self {
        Self {
            kind: item.kind,
            id: item.id,
            title: item.title,
            subtitle: item.subtitle,
            description: item.description,
            start_date: item.start_date,
            end_date: item.end_date,
            attachments: item.attachments,
            verified: item.verified,
        }
    }
}

/// Public identity of a student or verifier
#[derive(Debug, Clone, Serialize)]
pub struct PersonView {
    pub name: String,
    pub email: String,
    pub institute: Option<String>,
}

impl From<UserProfile> for PersonView {
    fn from(user: UserProfile) -> Self {
        Self {
            name: user.display_name().to_string(),
            email: user.email.to_string(),
            institute: user.institute,
        }
    }
}

/// Response for GET /token/{token}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: VerificationRequestId,
    pub status: RequestState,
    pub verifier_email: String,
    pub comment: Option<String>,
    pub acted_by: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub item: ItemView,
    pub student: Option<PersonView>,
    pub verifier: Option<PersonView>,
}

impl From<ReviewOutput> for ReviewResponse {
    fn from(out: ReviewOutput) -> Self {
        let r = out.request;
        Self {
            id: r.id,
            status: out.state,
            verifier_email: r.verifier_email.to_string(),
            comment: r.comment,
            acted_by: r.acted_by,
            acted_at: r.acted_at,
            expires_at: r.expires_at,
            created_at: r.created_at,
            item: out.item.into(),
            student: out.student.map(Into::into),
            verifier: out.verifier.map(Into::into),
        }
    }
}

/// Response for POST /token/{token}/approve and /reject
#[derive(Debug, Clone, Serialize)]
pub struct DecisionResponse {
    pub id: VerificationRequestId,
    pub status: VerificationStatus,
}

/// One audit entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub action: LogAction,
    pub actor_email: String,
    pub metadata: LogMetadata,
    pub timestamp: DateTime<Utc>,
}

impl From<VerificationLogEntry> for TimelineEntry {
    fn from(entry: VerificationLogEntry) -> Self {
        Self {
            action: entry.action,
            actor_email: entry.actor_email,
            metadata: entry.metadata,
            timestamp: entry.created_at,
        }
    }
}

/// Response for GET /requests/{id}/timeline
#[derive(Debug, Clone, Serialize)]
pub struct TimelineResponse {
    pub entries: Vec<TimelineEntry>,
}

/// Response for POST /items/{kind}/{id}/withdraw
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawResponse {
    pub withdrawn: usize,
}
