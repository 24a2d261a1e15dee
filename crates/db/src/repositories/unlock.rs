//! Property unlock repository.

use std::sync::Arc;

use chrono::Utc;
use proplet_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::entities::{
    PropertyUnlock,
    property_unlock::{self, UnlockStatus},
};

/// Repository for per-property unlock grants.
#[derive(Clone)]
pub struct UnlockRepository {
    db: Arc<DatabaseConnection>,
}

impl UnlockRepository {
    /// Create a new unlock repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the unlock record for a (tenant, property) pair.
    ///
    /// The unique pair index keeps this to at most one row.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        property_id: &str,
    ) -> AppResult<Option<property_unlock::Model>> {
        PropertyUnlock::find()
            .filter(property_unlock::Column::UserId.eq(user_id))
            .filter(property_unlock::Column::PropertyId.eq(property_id))
            .order_by(property_unlock::Column::Status, Order::Desc)
            .order_by(property_unlock::Column::CreatedAt, Order::Desc)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether the pair holds an active unlock grant.
    pub async fn has_unlocked(&self, user_id: &str, property_id: &str) -> AppResult<bool> {
        let count = PropertyUnlock::find()
            .filter(property_unlock::Column::UserId.eq(user_id))
            .filter(property_unlock::Column::PropertyId.eq(property_id))
            .filter(property_unlock::Column::Status.eq(UnlockStatus::Unlocked))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Find an unlock record by its payment reference.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> AppResult<Option<property_unlock::Model>> {
        PropertyUnlock::find()
            .filter(property_unlock::Column::Reference.eq(reference))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an unlock record unless the pair already has one.
    ///
    /// The unique (user_id, property_id) index arbitrates concurrent
    /// initializations: the loser gets `None` and must re-read the surviving
    /// row instead of raising a second charge.
    pub async fn create_if_absent(
        &self,
        model: property_unlock::ActiveModel,
    ) -> AppResult<Option<property_unlock::Model>> {
        let insert = PropertyUnlock::insert(model).on_conflict(
            OnConflict::columns([
                property_unlock::Column::UserId,
                property_unlock::Column::PropertyId,
            ])
            .do_nothing()
            .to_owned(),
        );

        match insert.exec_with_returning(self.db.as_ref()).await {
            Ok(created) => Ok(Some(created)),
            Err(DbErr::RecordNotInserted | DbErr::RecordNotFound(_)) => Ok(None),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Promote a pending record to `unlocked`.
    ///
    /// Conditional update keyed on the current status: replayed redirects and
    /// concurrent verifications race here, and at most one caller flips the
    /// row. Returns the number of rows affected.
    pub async fn promote(&self, reference: &str) -> AppResult<u64> {
        let result = PropertyUnlock::update_many()
            .col_expr(
                property_unlock::Column::Status,
                Expr::value(UnlockStatus::Unlocked),
            )
            .col_expr(property_unlock::Column::UnlockedAt, Expr::value(Utc::now()))
            .filter(property_unlock::Column::Reference.eq(reference))
            .filter(property_unlock::Column::Status.eq(UnlockStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// List a tenant's unlock records, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<property_unlock::Model>> {
        use sea_orm::QuerySelect;

        PropertyUnlock::find()
            .filter(property_unlock::Column::UserId.eq(user_id))
            .order_by(property_unlock::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::mock_unlock;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_by_reference() {
        let unlock = mock_unlock("u1", "tenant1", "prop1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[unlock.clone()]])
                .into_connection(),
        );

        let repo = UnlockRepository::new(db);
        let found = repo.find_by_reference("plt_u1").await.unwrap();

        assert_eq!(found.unwrap().property_id, "prop1");
    }

    #[tokio::test]
    async fn test_has_unlocked() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .into_connection(),
        );

        let repo = UnlockRepository::new(db);
        assert!(repo.has_unlocked("tenant1", "prop1").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_if_absent_yields_none_on_conflict() {
        let created = mock_unlock("u1", "tenant1", "prop1");

        // First insert returns the row; the second hits the unique pair
        // index, inserts nothing, and the RETURNING set is empty.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![created.clone()],
                    Vec::<property_unlock::Model>::new(),
                ])
                .into_connection(),
        );

        let repo = UnlockRepository::new(db);

        let model: property_unlock::ActiveModel = created.into();
        assert!(
            repo.create_if_absent(model.clone())
                .await
                .unwrap()
                .is_some()
        );
        assert!(repo.create_if_absent(model).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_promote_is_single_winner() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = UnlockRepository::new(db);

        assert_eq!(repo.promote("plt_u1").await.unwrap(), 1);
        // Replayed redirect: the row is no longer pending.
        assert_eq!(repo.promote("plt_u1").await.unwrap(), 0);
    }
}
