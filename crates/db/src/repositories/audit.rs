//! Audit log and fraud flag repository.

use std::sync::Arc;

use chrono::Utc;
use proplet_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::{AuditLog, FraudFlag, audit_log, fraud_flag};

/// Repository for the append-only audit trail.
#[derive(Clone)]
pub struct AuditRepository {
    db: Arc<DatabaseConnection>,
}

impl AuditRepository {
    /// Create a new audit repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an audit entry.
    pub async fn record(
        &self,
        id: String,
        actor_id: &str,
        action: &str,
        target_type: &str,
        target_id: &str,
    ) -> AppResult<audit_log::Model> {
        let model = audit_log::ActiveModel {
            id: Set(id),
            actor_id: Set(actor_id.to_string()),
            action: Set(action.to_string()),
            target_type: Set(target_type.to_string()),
            target_id: Set(target_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List audit entries, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<audit_log::Model>> {
        AuditLog::find()
            .order_by(audit_log::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Append a fraud flag.
    pub async fn create_flag(
        &self,
        model: fraud_flag::ActiveModel,
    ) -> AppResult<fraud_flag::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List unresolved fraud flags, newest first.
    pub async fn list_unresolved(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<fraud_flag::Model>> {
        FraudFlag::find()
            .filter(fraud_flag::Column::Resolved.eq(false))
            .order_by(fraud_flag::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Resolve a fraud flag. Returns rows affected; zero means the flag was
    /// missing or already resolved.
    pub async fn resolve_flag(&self, flag_id: &str, admin_id: &str) -> AppResult<u64> {
        let result = FraudFlag::update_many()
            .col_expr(fraud_flag::Column::Resolved, Expr::value(true))
            .col_expr(
                fraud_flag::Column::ResolvedBy,
                Expr::value(Some(admin_id.to_string())),
            )
            .filter(fraud_flag::Column::Id.eq(flag_id))
            .filter(fraud_flag::Column::Resolved.eq(false))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_resolve_flag_idempotent() {
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

        let repo = AuditRepository::new(db);
        assert_eq!(repo.resolve_flag("flag1", "admin1").await.unwrap(), 1);
        assert_eq!(repo.resolve_flag("flag1", "admin1").await.unwrap(), 0);
    }
}
