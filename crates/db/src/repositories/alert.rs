//! Property alert repository.

use std::sync::Arc;

use chrono::Utc;
use proplet_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{PropertyAlert, property_alert};

/// Repository for tenant property alerts.
#[derive(Clone)]
pub struct AlertRepository {
    db: Arc<DatabaseConnection>,
}

impl AlertRepository {
    /// Create a new alert repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an alert by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<property_alert::Model>> {
        PropertyAlert::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new alert.
    pub async fn create(
        &self,
        model: property_alert::ActiveModel,
    ) -> AppResult<property_alert::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find open alerts for a property type.
    ///
    /// Coarse filter only; the matcher applies the remaining criteria per
    /// alert. An alert with `notified_at` set is terminal and never returned.
    pub async fn find_open_by_type(
        &self,
        property_type: &str,
    ) -> AppResult<Vec<property_alert::Model>> {
        PropertyAlert::find()
            .filter(property_alert::Column::Active.eq(true))
            .filter(property_alert::Column::NotifiedAt.is_null())
            .filter(property_alert::Column::PropertyType.eq(property_type))
            .order_by(property_alert::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Claim an alert for a property.
    ///
    /// Sets `notified_at` and `matched_property_id` only if the alert is
    /// still unclaimed; when two property approvals match the same alert
    /// concurrently, exactly one claim succeeds. Returns rows affected.
    pub async fn claim(&self, alert_id: &str, property_id: &str) -> AppResult<u64> {
        let result = PropertyAlert::update_many()
            .col_expr(property_alert::Column::NotifiedAt, Expr::value(Utc::now()))
            .col_expr(
                property_alert::Column::MatchedPropertyId,
                Expr::value(Some(property_id.to_string())),
            )
            .filter(property_alert::Column::Id.eq(alert_id))
            .filter(property_alert::Column::Active.eq(true))
            .filter(property_alert::Column::NotifiedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// List alerts registered with an email address, newest first.
    pub async fn list_for_email(
        &self,
        email: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<property_alert::Model>> {
        PropertyAlert::find()
            .filter(property_alert::Column::Email.eq(email))
            .order_by(property_alert::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count open alerts.
    pub async fn count_open(&self) -> AppResult<u64> {
        PropertyAlert::find()
            .filter(property_alert::Column::Active.eq(true))
            .filter(property_alert::Column::NotifiedAt.is_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::mock_alert;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_open_by_type() {
        let a1 = mock_alert("alert1");
        let a2 = mock_alert("alert2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a1, a2]])
                .into_connection(),
        );

        let repo = AlertRepository::new(db);
        let open = repo.find_open_by_type("apartment").await.unwrap();

        assert_eq!(open.len(), 2);
    }

    #[tokio::test]
    async fn test_claim_at_most_once() {
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

        let repo = AlertRepository::new(db);

        // Two approvals race for the same alert; one winner.
        assert_eq!(repo.claim("alert1", "prop1").await.unwrap(), 1);
        assert_eq!(repo.claim("alert1", "prop2").await.unwrap(), 0);
    }
}
