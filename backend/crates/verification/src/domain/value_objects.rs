//! Domain Value Objects
//!
//! Immutable value types for the verification domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VerificationError;

// ============================================================================
// ItemKind
// ============================================================================

/// The three kinds of portfolio item that can be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Experience,
    Education,
    Project,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [ItemKind::Experience, ItemKind::Education, ItemKind::Project];

    /// Stored and wire representation
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            ItemKind::Experience => "EXPERIENCE",
            ItemKind::Education => "EDUCATION",
            ItemKind::Project => "PROJECT",
        }
    }

    /// Human wording for emails
    #[inline]
    pub const fn label(&self) -> &'static str {
        match self {
            ItemKind::Experience => "experience",
            ItemKind::Education => "education record",
            ItemKind::Project => "project",
        }
    }

    /// Parse a code, ignoring case and surrounding whitespace
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(code))
    }
}

impl FromStr for ItemKind {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| {
            VerificationError::InvalidArgument(format!(
                "Unknown item kind '{}': expected EXPERIENCE, EDUCATION or PROJECT",
                s.trim()
            ))
        })
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// VerificationStatus
// ============================================================================

/// Stored status of a verification request.
///
/// There is no EXPIRED value: expiry is derived from `expires_at` at read
/// time and overrides whatever is stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Approved => "APPROVED",
            VerificationStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PENDING" => Some(VerificationStatus::Pending),
            "APPROVED" => Some(VerificationStatus::Approved),
            "REJECTED" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }

    /// APPROVED and REJECTED never transition again
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, VerificationStatus::Approved | VerificationStatus::Rejected)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The two outcomes a verifier can choose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Status the request moves to
    #[inline]
    pub const fn status(&self) -> VerificationStatus {
        match self {
            Decision::Approve => VerificationStatus::Approved,
            Decision::Reject => VerificationStatus::Rejected,
        }
    }

    /// Audit action recorded for this decision
    #[inline]
    pub const fn log_action(&self) -> LogAction {
        match self {
            Decision::Approve => LogAction::Approved,
            Decision::Reject => LogAction::Rejected,
        }
    }
}

/// Status as seen by a reader at a given instant.
///
/// Adds EXPIRED on top of the stored status for PENDING requests whose
/// `expires_at` has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl RequestState {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            RequestState::Pending => "PENDING",
            RequestState::Approved => "APPROVED",
            RequestState::Rejected => "REJECTED",
            RequestState::Expired => "EXPIRED",
        }
    }
}

impl From<VerificationStatus> for RequestState {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Pending => RequestState::Pending,
            VerificationStatus::Approved => RequestState::Approved,
            VerificationStatus::Rejected => RequestState::Rejected,
        }
    }
}

// ============================================================================
// LogAction
// ============================================================================

/// Audit action recorded against a verification request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
    Created,
    Viewed,
    Approved,
    Rejected,
    Withdrawn,
}

impl LogAction {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            LogAction::Created => "CREATED",
            LogAction::Viewed => "VIEWED",
            LogAction::Approved => "APPROVED",
            LogAction::Rejected => "REJECTED",
            LogAction::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CREATED" => Some(LogAction::Created),
            "VIEWED" => Some(LogAction::Viewed),
            "APPROVED" => Some(LogAction::Approved),
            "REJECTED" => Some(LogAction::Rejected),
            "WITHDRAWN" => Some(LogAction::Withdrawn),
            _ => None,
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// UserRole
// ============================================================================

/// Role of a portfolio user, as reported by the identity layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Verifier,
    Admin,
}

impl UserRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            UserRole::Student => "STUDENT",
            UserRole::Verifier => "VERIFIER",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "STUDENT" => Some(UserRole::Student),
            "VERIFIER" => Some(UserRole::Verifier),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }

    #[inline]
    pub const fn can_verify(&self) -> bool {
        matches!(self, UserRole::Verifier)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Email
// ============================================================================

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Normalized email address (trimmed, lowercased, basic shape check)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str, field: &str) -> Result<Self, VerificationError> {
        let email = raw.trim().to_lowercase();

        if email.is_empty() {
            return Err(VerificationError::InvalidArgument(format!("{field} is required")));
        }
        if email.len() > EMAIL_MAX_LENGTH || !Self::is_valid_format(&email) {
            return Err(VerificationError::InvalidArgument(format!(
                "{field} is not a valid email address"
            )));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || domain.contains('@') {
            return false;
        }

        if domain.is_empty() || !domain.contains('.') {
            return false;
        }

        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return false;
        }

        !(domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']))
    }

    /// Wrap a value read back from storage (assumed already normalized)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Comment
// ============================================================================

/// Normalize a verifier comment: trimmed, blank means none, bounded length.
pub fn normalize_comment(
    comment: Option<String>,
    max_len: usize,
) -> Result<Option<String>, VerificationError> {
    let Some(comment) = comment else {
        return Ok(None);
    };
    let comment = comment.trim();
    if comment.is_empty() {
        return Ok(None);
    }
    if comment.chars().count() > max_len {
        return Err(VerificationError::InvalidArgument(format!(
            "Comment must be at most {max_len} characters"
        )));
    }
    Ok(Some(comment.to_string()))
}

/// Institutes match only when both are present, non-blank and equal
/// byte for byte.
pub fn institutes_match(requester: Option<&str>, verifier: Option<&str>) -> Option<bool> {
    let requester = requester.filter(|s| !s.trim().is_empty())?;
    let verifier = verifier.filter(|s| !s.trim().is_empty())?;
    Some(requester == verifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_parse_case_insensitive() {
        assert_eq!(ItemKind::from_code("experience"), Some(ItemKind::Experience));
        assert_eq!(ItemKind::from_code(" Education "), Some(ItemKind::Education));
        assert_eq!(ItemKind::from_code("PROJECT"), Some(ItemKind::Project));
        assert_eq!(ItemKind::from_code("award"), None);
        assert!(matches!(
            "award".parse::<ItemKind>(),
            Err(VerificationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_item_kind_serde() {
        let json = serde_json::to_string(&ItemKind::Education).unwrap();
        assert_eq!(json, "\"EDUCATION\"");
    }

    #[test]
    fn test_status_codes_roundtrip_and_terminality() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::Approved,
            VerificationStatus::Rejected,
        ] {
            assert_eq!(VerificationStatus::from_code(status.code()), Some(status));
        }
        assert!(!VerificationStatus::Pending.is_terminal());
        assert!(VerificationStatus::Approved.is_terminal());
        assert!(VerificationStatus::Rejected.is_terminal());
        assert_eq!(VerificationStatus::from_code("EXPIRED"), None);
    }

    #[test]
    fn test_decision_mapping() {
        assert_eq!(Decision::Approve.status(), VerificationStatus::Approved);
        assert_eq!(Decision::Reject.status(), VerificationStatus::Rejected);
        assert_eq!(Decision::Approve.log_action(), LogAction::Approved);
        assert_eq!(Decision::Reject.log_action(), LogAction::Rejected);
    }

    #[test]
    fn test_only_verifiers_can_verify() {
        assert!(UserRole::Verifier.can_verify());
        assert!(!UserRole::Student.can_verify());
        assert!(!UserRole::Admin.can_verify());
    }

    #[test]
    fn test_email_normalization() {
        let email = Email::parse("  Prof.Smith@MIT.edu ", "verifierEmail").unwrap();
        assert_eq!(email.as_str(), "prof.smith@mit.edu");
    }

    #[test]
    fn test_email_invalid() {
        for raw in ["", "   ", "no-at-sign", "a@b", "@mit.edu", "a@@mit.edu", "a@.mit.edu"] {
            assert!(
                matches!(
                    Email::parse(raw, "verifierEmail"),
                    Err(VerificationError::InvalidArgument(_))
                ),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalize_comment() {
        assert_eq!(normalize_comment(None, 10).unwrap(), None);
        assert_eq!(normalize_comment(Some("   ".into()), 10).unwrap(), None);
        assert_eq!(
            normalize_comment(Some("  Great work ".into()), 20).unwrap(),
            Some("Great work".to_string())
        );
        assert!(normalize_comment(Some("x".repeat(11)), 10).is_err());
    }

    #[test]
    fn test_institutes_match() {
        assert_eq!(institutes_match(Some("MIT"), Some("MIT")), Some(true));
        assert_eq!(institutes_match(Some("MIT"), Some("mit")), Some(false));
        assert_eq!(institutes_match(Some("MIT"), Some("Stanford")), Some(false));
        assert_eq!(institutes_match(None, Some("MIT")), None);
        assert_eq!(institutes_match(Some("MIT"), Some("  ")), None);
    }
}
