//! Property repository.

use std::sync::Arc;

use chrono::Utc;
use proplet_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{
    Property, User,
    property::{self, PropertyStatus},
    user,
};

/// Repository for property listings.
#[derive(Clone)]
pub struct PropertyRepository {
    db: Arc<DatabaseConnection>,
}

impl PropertyRepository {
    /// Create a new property repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a property by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<property::Model>> {
        Property::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a property by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<property::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Property not found: {id}")))
    }

    /// Fetch a property together with its landlord.
    ///
    /// The landlord row feeds the protected contact fields of the full view.
    pub async fn find_with_landlord(
        &self,
        id: &str,
    ) -> AppResult<Option<(property::Model, Option<user::Model>)>> {
        Property::find_by_id(id)
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new listing.
    pub async fn create(&self, model: property::ActiveModel) -> AppResult<property::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approve a pending listing.
    ///
    /// Conditional update so concurrent moderation decisions cannot both
    /// apply. Returns rows affected; zero means missing or already decided.
    pub async fn approve(&self, property_id: &str, admin_id: &str) -> AppResult<u64> {
        self.moderate(property_id, admin_id, PropertyStatus::Approved)
            .await
    }

    /// Reject a pending listing.
    pub async fn reject(&self, property_id: &str, admin_id: &str) -> AppResult<u64> {
        self.moderate(property_id, admin_id, PropertyStatus::Rejected)
            .await
    }

    async fn moderate(
        &self,
        property_id: &str,
        admin_id: &str,
        status: PropertyStatus,
    ) -> AppResult<u64> {
        let result = Property::update_many()
            .col_expr(property::Column::Status, Expr::value(status))
            .col_expr(
                property::Column::ModeratedBy,
                Expr::value(Some(admin_id.to_string())),
            )
            .col_expr(property::Column::ModeratedAt, Expr::value(Utc::now()))
            .col_expr(property::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(property::Column::Id.eq(property_id))
            .filter(property::Column::Status.eq(PropertyStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// List pending listings for the moderation queue, oldest first.
    pub async fn list_pending(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<property::Model>> {
        Property::find()
            .filter(property::Column::Status.eq(PropertyStatus::Pending))
            .order_by(property::Column::CreatedAt, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a landlord's listings, newest first.
    pub async fn list_for_landlord(
        &self,
        landlord_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<property::Model>> {
        Property::find()
            .filter(property::Column::LandlordId.eq(landlord_id))
            .order_by(property::Column::CreatedAt, Order::Desc)
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
    use crate::test_utils::mock_property;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_get_by_id() {
        let prop = mock_property("prop1", "landlord1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[prop.clone()]])
                .into_connection(),
        );

        let repo = PropertyRepository::new(db);
        let found = repo.get_by_id("prop1").await.unwrap();

        assert_eq!(found.city, "Lekki");
    }

    #[tokio::test]
    async fn test_approve_already_decided() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PropertyRepository::new(db);
        assert_eq!(repo.approve("prop1", "admin1").await.unwrap(), 0);
    }
}
