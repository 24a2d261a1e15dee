//! User repository.

use std::sync::Arc;

use chrono::Utc;
use proplet_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{
    User,
    user::{self, UserRole},
};

/// Repository for user and identity operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Condition identifying identities ready for admin review.
    ///
    /// Photo and document number present, both contact channels verified,
    /// not yet identity-verified, not soft-deleted, and a reviewable role.
    fn pending_review_condition() -> Condition {
        Condition::all()
            .add(user::Column::IdentityVerified.eq(false))
            .add(user::Column::IdentityPhotoUrl.is_not_null())
            .add(user::Column::DocumentNumber.is_not_null())
            .add(user::Column::EmailVerified.eq(true))
            .add(user::Column::PhoneVerified.eq(true))
            .add(user::Column::DeletedAt.is_null())
            .add(user::Column::UserType.is_in([UserRole::Tenant, UserRole::Landlord]))
    }

    /// Find user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))
    }

    /// Find user by API token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .filter(user::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find identities awaiting review, earliest submission first.
    ///
    /// `search` filters on name, email, or document number.
    pub async fn find_pending_review(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        let mut condition = Self::pending_review_condition();

        if let Some(query) = search {
            let query = query.trim();
            if !query.is_empty() {
                condition = condition.add(
                    Condition::any()
                        .add(user::Column::FullName.contains(query))
                        .add(user::Column::Email.contains(query))
                        .add(user::Column::DocumentNumber.contains(query)),
                );
            }
        }

        // FIFO: earliest submissions reviewed first. Id is a tiebreaker so
        // pagination stays deterministic.
        User::find()
            .filter(condition)
            .order_by(user::Column::IdentitySubmittedAt, Order::Asc)
            .order_by(user::Column::Id, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count identities awaiting review.
    pub async fn count_pending_review(&self, search: Option<&str>) -> AppResult<u64> {
        let mut condition = Self::pending_review_condition();

        if let Some(query) = search {
            let query = query.trim();
            if !query.is_empty() {
                condition = condition.add(
                    Condition::any()
                        .add(user::Column::FullName.contains(query))
                        .add(user::Column::Email.contains(query))
                        .add(user::Column::DocumentNumber.contains(query)),
                );
            }
        }

        User::find()
            .filter(condition)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approve an identity if it is still eligible.
    ///
    /// Conditional update: the eligibility predicate is re-checked inside the
    /// UPDATE itself, so two concurrent approvals cannot both win. Returns
    /// the number of rows affected; zero means the record was missing,
    /// already verified, or otherwise ineligible.
    pub async fn approve_identity(&self, user_id: &str, admin_id: &str) -> AppResult<u64> {
        let result = User::update_many()
            .col_expr(user::Column::IdentityVerified, Expr::value(true))
            .col_expr(
                user::Column::IdentityVerifiedBy,
                Expr::value(Some(admin_id.to_string())),
            )
            .col_expr(user::Column::IdentityVerifiedAt, Expr::value(Utc::now()))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(user_id))
            .filter(Self::pending_review_condition())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Reject an identity: clear the photo and all verifier metadata.
    ///
    /// Documents are cleared so the user must submit a fresh photo before
    /// re-entering the review queue.
    pub async fn reject_identity(&self, user_id: &str) -> AppResult<u64> {
        let result = User::update_many()
            .col_expr(user::Column::IdentityVerified, Expr::value(false))
            .col_expr(
                user::Column::IdentityPhotoUrl,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                user::Column::IdentityVerifiedBy,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                user::Column::IdentityVerifiedAt,
                Expr::value(Option::<chrono::DateTime<chrono::FixedOffset>>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Mark a contact channel as verified.
    pub async fn set_contact_verified(&self, user_id: &str, email: bool) -> AppResult<()> {
        let column = if email {
            user::Column::EmailVerified
        } else {
            user::Column::PhoneVerified
        };

        User::update_many()
            .col_expr(column, Expr::value(true))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Deactivate subscriptions whose expiry has passed.
    ///
    /// The access gate re-checks the expiry timestamp on every request, so
    /// this sweep only keeps the stored flag from drifting indefinitely.
    pub async fn sweep_expired_subscriptions(&self) -> AppResult<u64> {
        let result = User::update_many()
            .col_expr(user::Column::SubscriptionActive, Expr::value(false))
            .filter(user::Column::SubscriptionActive.eq(true))
            .filter(user::Column::SubscriptionExpiresAt.lt(Utc::now()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::mock_tenant;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_by_id() {
        let tenant = mock_tenant("user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tenant.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_id("user1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "user1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_approve_identity_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);

        // First caller wins, second observes a no-op.
        assert_eq!(repo.approve_identity("user1", "admin1").await.unwrap(), 1);
        assert_eq!(repo.approve_identity("user1", "admin1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_expired_subscriptions() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert_eq!(repo.sweep_expired_subscriptions().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_count_pending_review() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert_eq!(repo.count_pending_review(None).await.unwrap(), 2);
    }
}
