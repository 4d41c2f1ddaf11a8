//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{ItemId, UserId, VerificationRequestId};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entities::{
    DecisionRecord, LogMetadata, UserProfile, VerificationLogEntry, VerificationRequest,
};
use crate::domain::repository::{
    CreateOutcome, DecideOutcome, UserDirectory, VerificationLogRepository,
    VerificationRequestRepository,
};
use crate::domain::value_objects::{Email, ItemKind, LogAction, UserRole, VerificationStatus};
use crate::error::{VerificationError, VerificationResult};
use crate::infra::items::ItemTable;

/// Unique constraint on `verification_requests.token`
const TOKEN_UNIQUE_CONSTRAINT: &str = "verification_requests_token_key";

const REQUEST_COLUMNS: &str = r#"
    id,
    item_kind,
    item_id,
    requester_id,
    verifier_email,
    token,
    status,
    comment,
    acted_by,
    acted_at,
    expires_at,
    created_at
"#;

/// PostgreSQL-backed verification request and audit log repository
#[derive(Clone)]
pub struct PgVerificationRepository {
    pool: PgPool,
}

impl PgVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of PENDING requests whose link has expired. They are kept for
    /// history; this only feeds the startup report.
    pub async fn count_stale_pending(&self) -> VerificationResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM verification_requests WHERE status = 'PENDING' AND expires_at <= $1",
        )
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

impl VerificationRequestRepository for PgVerificationRepository {
    async fn create_pending(
        &self,
        request: &VerificationRequest,
        now: DateTime<Utc>,
    ) -> VerificationResult<CreateOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serialize creators for the same item for the rest of the transaction
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!(
                "verification:{}:{}",
                request.item_kind.code(),
                request.item_id
            ))
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO verification_requests (
                id,
                item_kind,
                item_id,
                requester_id,
                verifier_email,
                token,
                status,
                expires_at,
                created_at
            )
            SELECT $1, $2, $3, $4, $5, $6, 'PENDING', $7, $8
            WHERE NOT EXISTS (
                SELECT 1 FROM verification_requests
                WHERE item_kind = $2
                  AND item_id = $3
                  AND status = 'PENDING'
                  AND expires_at > $9
            )
            "#,
        )
        .bind(request.id.into_uuid())
        .bind(request.item_kind.code())
        .bind(request.item_id.into_uuid())
        .bind(request.requester_id.into_uuid())
        .bind(request.verifier_email.as_str())
        .bind(&request.token)
        .bind(request.expires_at)
        .bind(request.created_at)
        .bind(now)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(result) if result.rows_affected() == 0 => {
                tx.rollback().await?;
                Ok(CreateOutcome::PendingExists)
            }
            Ok(_) => {
                tx.commit().await?;
                tracing::debug!(verification_id = %request.id, "Verification request stored");
                Ok(CreateOutcome::Created)
            }
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some(TOKEN_UNIQUE_CONSTRAINT) =>
            {
                tx.rollback().await?;
                Ok(CreateOutcome::TokenCollision)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_token(&self, token: &str) -> VerificationResult<Option<VerificationRequest>> {
        let row = sqlx::query_as::<_, VerificationRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM verification_requests WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(VerificationRequestRow::into_entity).transpose()
    }

    async fn find_by_id(
        &self,
        id: VerificationRequestId,
    ) -> VerificationResult<Option<VerificationRequest>> {
        let row = sqlx::query_as::<_, VerificationRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM verification_requests WHERE id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VerificationRequestRow::into_entity).transpose()
    }

    async fn decide(
        &self,
        token: &str,
        decision: &DecisionRecord,
        now: DateTime<Utc>,
    ) -> VerificationResult<DecideOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, VerificationRequestRow>(&format!(
            r#"
            UPDATE verification_requests
            SET status = $2, acted_by = $3, comment = $4, acted_at = $5
            WHERE token = $1 AND status = 'PENDING' AND expires_at > $6
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(decision.status.code())
        .bind(decision.acted_by.as_str())
        .bind(decision.comment.as_deref())
        .bind(decision.acted_at)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(DecideOutcome::NotLive);
        };
        let decided = row.into_entity()?;

        let table = ItemTable::for_kind(decided.item_kind);
        let approved = decision.status == VerificationStatus::Approved;
        let sql = if approved {
            table.approve_sql()
        } else {
            table.reject_sql()
        };
        let mut mark = sqlx::query(&sql)
            .bind(decided.item_id.into_uuid())
            .bind(decision.acted_by.as_str())
            .bind(decision.comment.as_deref());
        if approved {
            mark = mark.bind(decision.acted_at);
        }
        let marked = mark.execute(&mut *tx).await?;

        if marked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(DecideOutcome::ItemMissing);
        }

        tx.commit().await?;
        Ok(DecideOutcome::Decided(decided))
    }

    async fn list_for_item(
        &self,
        kind: ItemKind,
        item_id: ItemId,
    ) -> VerificationResult<Vec<VerificationRequest>> {
        let rows = sqlx::query_as::<_, VerificationRequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM verification_requests
            WHERE item_kind = $1 AND item_id = $2
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(kind.code())
        .bind(item_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(VerificationRequestRow::into_entity)
            .collect()
    }

    async fn expire_pending_for_item(
        &self,
        kind: ItemKind,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> VerificationResult<Vec<VerificationRequest>> {
        let rows = sqlx::query_as::<_, VerificationRequestRow>(&format!(
            r#"
            UPDATE verification_requests
            SET expires_at = $3
            WHERE item_kind = $1 AND item_id = $2 AND status = 'PENDING' AND expires_at > $3
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(kind.code())
        .bind(item_id.into_uuid())
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(VerificationRequestRow::into_entity)
            .collect()
    }
}

impl VerificationLogRepository for PgVerificationRepository {
    async fn append(&self, entry: &VerificationLogEntry) -> VerificationResult<()> {
        sqlx::query(
            r#"
            INSERT INTO verification_logs (
                id,
                verification_id,
                action,
                actor_email,
                metadata,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.into_uuid())
        .bind(entry.verification_id.into_uuid())
        .bind(entry.action.code())
        .bind(&entry.actor_email)
        .bind(Json(&entry.metadata))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_request(
        &self,
        verification_id: VerificationRequestId,
    ) -> VerificationResult<Vec<VerificationLogEntry>> {
        let rows = sqlx::query_as::<_, VerificationLogRow>(
            r#"
            SELECT id, verification_id, action, actor_email, metadata, created_at
            FROM verification_logs
            WHERE verification_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(verification_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VerificationLogRow::into_entity).collect()
    }
}

/// Identity lookup over the `users` table
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &Email) -> VerificationResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, institute FROM users WHERE lower(email) = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_entity).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> VerificationResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, institute FROM users WHERE id = $1",
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_entity).transpose()
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct VerificationRequestRow {
    id: Uuid,
    item_kind: String,
    item_id: Uuid,
    requester_id: Uuid,
    verifier_email: String,
    token: String,
    status: String,
    comment: Option<String>,
    acted_by: Option<String>,
    acted_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl VerificationRequestRow {
    fn into_entity(self) -> VerificationResult<VerificationRequest> {
        Ok(VerificationRequest {
            id: self.id.into(),
            item_kind: ItemKind::from_code(&self.item_kind)
                .ok_or_else(|| corrupt("item_kind", &self.item_kind))?,
            item_id: self.item_id.into(),
            requester_id: self.requester_id.into(),
            verifier_email: Email::from_db(self.verifier_email),
            token: self.token,
            status: VerificationStatus::from_code(&self.status)
                .ok_or_else(|| corrupt("status", &self.status))?,
            comment: self.comment,
            acted_by: self.acted_by,
            acted_at: self.acted_at,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VerificationLogRow {
    id: Uuid,
    verification_id: Uuid,
    action: String,
    actor_email: String,
    metadata: Json<LogMetadata>,
    created_at: DateTime<Utc>,
}

impl VerificationLogRow {
    fn into_entity(self) -> VerificationResult<VerificationLogEntry> {
        Ok(VerificationLogEntry {
            id: self.id.into(),
            verification_id: self.verification_id.into(),
            action: LogAction::from_code(&self.action)
                .ok_or_else(|| corrupt("action", &self.action))?,
            actor_email: self.actor_email,
            metadata: self.metadata.0,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    institute: Option<String>,
}

impl UserRow {
    fn into_entity(self) -> VerificationResult<UserProfile> {
        Ok(UserProfile {
            id: self.id.into(),
            email: Email::from_db(self.email.to_lowercase()),
            name: self.name,
            role: UserRole::from_code(&self.role).ok_or_else(|| corrupt("role", &self.role))?,
            institute: self.institute,
        })
    }
}

fn corrupt(column: &str, value: &str) -> VerificationError {
    VerificationError::Internal(format!("unexpected {column} value '{value}' in database"))
}

// Run with `DATABASE_URL` pointing at a disposable PostgreSQL server:
// cargo test -p verification -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const TTL_HOURS: i64 = 72;

    async fn seed_experience(pool: &PgPool) -> (UserId, ItemId) {
        let owner = UserId::new();
        let item = ItemId::new();

        sqlx::query(
            "INSERT INTO users (id, email, name, role, institute) VALUES ($1, $2, 'Sam', 'STUDENT', 'MIT')",
        )
        .bind(owner.into_uuid())
        .bind(format!("sam-{owner}@mit.edu"))
        .execute(pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO experiences (id, user_id, role_title) VALUES ($1, $2, 'Research Assistant')",
        )
        .bind(item.into_uuid())
        .bind(owner.into_uuid())
        .execute(pool)
        .await
        .unwrap();

        (owner, item)
    }

    fn pending(owner: UserId, item: ItemId, token: &str, now: DateTime<Utc>) -> VerificationRequest {
        VerificationRequest::new(
            ItemKind::Experience,
            item,
            owner,
            Email::from_db("vega@mit.edu"),
            token.to_string(),
            now,
            Duration::hours(TTL_HOURS),
        )
    }

    fn decision(status: VerificationStatus, now: DateTime<Utc>) -> DecisionRecord {
        DecisionRecord {
            status,
            acted_by: Email::from_db("vega@mit.edu"),
            comment: Some("Confirmed with the lab".to_string()),
            acted_at: now,
        }
    }

    async fn item_flags(pool: &PgPool, item: ItemId) -> (bool, Option<String>) {
        sqlx::query_as::<_, (bool, Option<String>)>(
            "SELECT verified, verified_by FROM experiences WHERE id = $1",
        )
        .bind(item.into_uuid())
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_create_pending_allows_one_live_request_per_item(pool: PgPool) {
        let repo = PgVerificationRepository::new(pool.clone());
        let (owner, item) = seed_experience(&pool).await;
        let now = Utc::now();

        let first = repo
            .create_pending(&pending(owner, item, "token-first", now), now)
            .await
            .unwrap();
        assert_eq!(first, CreateOutcome::Created);

        let second = repo
            .create_pending(&pending(owner, item, "token-second", now), now)
            .await
            .unwrap();
        assert_eq!(second, CreateOutcome::PendingExists);
        assert!(repo.find_by_token("token-second").await.unwrap().is_none());

        // Once the first link lapses the item can be requested again
        let later = now + Duration::hours(TTL_HOURS + 1);
        let third = repo
            .create_pending(&pending(owner, item, "token-third", later), later)
            .await
            .unwrap();
        assert_eq!(third, CreateOutcome::Created);
        assert_eq!(repo.list_for_item(ItemKind::Experience, item).await.unwrap().len(), 2);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_create_pending_stores_exactly_one(pool: PgPool) {
        let repo = PgVerificationRepository::new(pool.clone());
        let (owner, item) = seed_experience(&pool).await;
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                let request = pending(owner, item, &format!("token-race-{i}"), now);
                tokio::spawn(async move { repo.create_pending(&request, now).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                CreateOutcome::Created => created += 1,
                CreateOutcome::PendingExists => {}
                CreateOutcome::TokenCollision => panic!("tokens are distinct"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.list_for_item(ItemKind::Experience, item).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_create_pending_reports_token_collision(pool: PgPool) {
        let repo = PgVerificationRepository::new(pool.clone());
        let (owner, first_item) = seed_experience(&pool).await;
        let (_, second_item) = seed_experience(&pool).await;
        let now = Utc::now();

        repo.create_pending(&pending(owner, first_item, "token-shared", now), now)
            .await
            .unwrap();
        let outcome = repo
            .create_pending(&pending(owner, second_item, "token-shared", now), now)
            .await
            .unwrap();

        assert_eq!(outcome, CreateOutcome::TokenCollision);
        assert!(repo.list_for_item(ItemKind::Experience, second_item).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_decide_updates_request_and_item_once(pool: PgPool) {
        let repo = PgVerificationRepository::new(pool.clone());
        let (owner, item) = seed_experience(&pool).await;
        let now = Utc::now();
        repo.create_pending(&pending(owner, item, "token-decide", now), now)
            .await
            .unwrap();

        let outcome = repo
            .decide("token-decide", &decision(VerificationStatus::Approved, now), now)
            .await
            .unwrap();
        let DecideOutcome::Decided(decided) = outcome else {
            panic!("expected a decision, got {outcome:?}");
        };
        assert_eq!(decided.status, VerificationStatus::Approved);
        assert_eq!(decided.acted_by.as_deref(), Some("vega@mit.edu"));
        assert_eq!(
            item_flags(&pool, item).await,
            (true, Some("vega@mit.edu".to_string()))
        );

        let again = repo
            .decide("token-decide", &decision(VerificationStatus::Rejected, now), now)
            .await
            .unwrap();
        assert_eq!(again, DecideOutcome::NotLive);
        let stored = repo.find_by_token("token-decide").await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Approved);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_reject_records_decider_without_verifying(pool: PgPool) {
        let repo = PgVerificationRepository::new(pool.clone());
        let (owner, item) = seed_experience(&pool).await;
        let now = Utc::now();
        repo.create_pending(&pending(owner, item, "token-reject", now), now)
            .await
            .unwrap();

        let outcome = repo
            .decide("token-reject", &decision(VerificationStatus::Rejected, now), now)
            .await
            .unwrap();

        assert!(matches!(outcome, DecideOutcome::Decided(_)));
        assert_eq!(
            item_flags(&pool, item).await,
            (false, Some("vega@mit.edu".to_string()))
        );
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_decide_ignores_expired_request(pool: PgPool) {
        let repo = PgVerificationRepository::new(pool.clone());
        let (owner, item) = seed_experience(&pool).await;
        let now = Utc::now();
        repo.create_pending(&pending(owner, item, "token-expired", now), now)
            .await
            .unwrap();

        let later = now + Duration::hours(TTL_HOURS);
        let outcome = repo
            .decide("token-expired", &decision(VerificationStatus::Approved, later), later)
            .await
            .unwrap();

        assert_eq!(outcome, DecideOutcome::NotLive);
        assert_eq!(item_flags(&pool, item).await, (false, None));
        let stored = repo.find_by_token("token-expired").await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Pending);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_decide_rolls_back_when_item_is_gone(pool: PgPool) {
        let repo = PgVerificationRepository::new(pool.clone());
        let (owner, item) = seed_experience(&pool).await;
        let now = Utc::now();
        repo.create_pending(&pending(owner, item, "token-orphan", now), now)
            .await
            .unwrap();
        sqlx::query("DELETE FROM experiences WHERE id = $1")
            .bind(item.into_uuid())
            .execute(&pool)
            .await
            .unwrap();

        let outcome = repo
            .decide("token-orphan", &decision(VerificationStatus::Approved, now), now)
            .await
            .unwrap();

        assert_eq!(outcome, DecideOutcome::ItemMissing);
        let stored = repo.find_by_token("token-orphan").await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Pending);
        assert!(stored.acted_by.is_none());
    }
}
