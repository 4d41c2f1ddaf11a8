//! PostgreSQL item stores
//!
//! The three item tables share their verification columns but name their
//! descriptive columns differently. One [`ItemTable`] per kind maps those
//! onto the kind-neutral [`ItemSnapshot`] fields.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{ItemId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::ItemSnapshot;
use crate::domain::repository::{ItemRepository, ItemStores};
use crate::domain::value_objects::ItemKind;
use crate::error::VerificationResult;

/// Column mapping for one item table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTable {
    pub kind: ItemKind,
    pub table: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
}

impl ItemTable {
    pub const EXPERIENCES: ItemTable = ItemTable {
        kind: ItemKind::Experience,
        table: "experiences",
        title: "role_title",
        subtitle: "organization",
        description: "description",
    };

    pub const EDUCATIONS: ItemTable = ItemTable {
        kind: ItemKind::Education,
        table: "educations",
        title: "degree",
        subtitle: "institution",
        description: "field_of_study",
    };

    pub const PROJECTS: ItemTable = ItemTable {
        kind: ItemKind::Project,
        table: "projects",
        title: "name",
        subtitle: "repository_url",
        description: "description",
    };

    pub const fn for_kind(kind: ItemKind) -> ItemTable {
        match kind {
            ItemKind::Experience => Self::EXPERIENCES,
            ItemKind::Education => Self::EDUCATIONS,
            ItemKind::Project => Self::PROJECTS,
        }
    }

    fn select_sql(&self, filter: &str) -> String {
        format!(
            r#"
            SELECT
                id,
                user_id,
                {title} AS title,
                {subtitle} AS subtitle,
                {description} AS description,
                start_date,
                end_date,
                attachments,
                verified,
                verified_at,
                verified_by,
                verifier_comment
            FROM {table}
            WHERE {filter}
            "#,
            title = self.title,
            subtitle = self.subtitle,
            description = self.description,
            table = self.table,
        )
    }

    /// Approve write: `$1` id, `$2` decided by, `$3` comment, `$4` decided at
    pub(crate) fn approve_sql(&self) -> String {
        format!(
            r#"
            UPDATE {table}
            SET verified = TRUE, verified_by = $2, verifier_comment = $3, verified_at = $4
            WHERE id = $1
            "#,
            table = self.table,
        )
    }

    /// Reject write: `$1` id, `$2` decided by, `$3` comment. `verified` is untouched.
    pub(crate) fn reject_sql(&self) -> String {
        format!(
            r#"
            UPDATE {table}
            SET verified_by = $2, verifier_comment = $3
            WHERE id = $1
            "#,
            table = self.table,
        )
    }
}

/// Item store for one kind of portfolio item
#[derive(Clone)]
pub struct PgItemRepository {
    pool: PgPool,
    table: ItemTable,
}

impl PgItemRepository {
    pub fn new(pool: PgPool, table: ItemTable) -> Self {
        Self { pool, table }
    }
}

/// One store per item kind, all on the same pool
pub fn pg_item_stores(pool: &PgPool) -> ItemStores<PgItemRepository> {
    ItemKind::ALL
        .into_iter()
        .fold(ItemStores::new(), |stores, kind| {
            stores.with(
                kind,
                PgItemRepository::new(pool.clone(), ItemTable::for_kind(kind)),
            )
        })
}

impl ItemRepository for PgItemRepository {
    async fn find_owned(
        &self,
        item_id: ItemId,
        owner_id: UserId,
    ) -> VerificationResult<Option<ItemSnapshot>> {
        let row = sqlx::query_as::<_, ItemRow>(&self.table.select_sql("id = $1 AND user_id = $2"))
            .bind(item_id.into_uuid())
            .bind(owner_id.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_entity(self.table.kind)))
    }

    async fn find(&self, item_id: ItemId) -> VerificationResult<Option<ItemSnapshot>> {
        let row = sqlx::query_as::<_, ItemRow>(&self.table.select_sql("id = $1"))
            .bind(item_id.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_entity(self.table.kind)))
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    subtitle: Option<String>,
    description: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    attachments: Vec<String>,
    verified: bool,
    verified_at: Option<DateTime<Utc>>,
    verified_by: Option<String>,
    verifier_comment: Option<String>,
}

impl ItemRow {
    fn into_entity(self, kind: ItemKind) -> ItemSnapshot {
        ItemSnapshot {
            kind,
            id: self.id.into(),
            owner_id: self.user_id.into(),
            title: self.title,
            subtitle: self.subtitle,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            attachments: self.attachments,
            verified: self.verified,
            verified_at: self.verified_at,
            verified_by: self.verified_by,
            verifier_comment: self.verifier_comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_cover_every_kind() {
        for kind in ItemKind::ALL {
            assert_eq!(ItemTable::for_kind(kind).kind, kind);
        }
    }

    #[test]
    fn test_select_sql_aliases_columns() {
        let sql = ItemTable::EDUCATIONS.select_sql("id = $1");
        assert!(sql.contains("degree AS title"));
        assert!(sql.contains("institution AS subtitle"));
        assert!(sql.contains("FROM educations"));
        assert!(sql.trim_end().ends_with("WHERE id = $1"));
    }

    #[test]
    fn test_reject_sql_leaves_verified_flag_alone() {
        let reject = ItemTable::PROJECTS.reject_sql();
        assert!(reject.contains("UPDATE projects"));
        assert!(!reject.contains("verified = TRUE"));
        assert!(!reject.contains("$4"));

        let approve = ItemTable::PROJECTS.approve_sql();
        assert!(approve.contains("verified = TRUE"));
        assert!(approve.contains("verified_at = $4"));
    }
}
