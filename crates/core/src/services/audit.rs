//! Super-admin audit surface.

use chrono::Utc;
use proplet_common::{AppError, AppResult, IdGenerator};
use proplet_db::entities::{audit_log, fraud_flag, user};
use proplet_db::repositories::AuditRepository;
use sea_orm::Set;

use super::policy;

/// Service for the audit trail and fraud flags.
#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
    id_gen: IdGenerator,
}

impl AuditService {
    /// Create a new audit service.
    #[must_use]
    pub const fn new(audit_repo: AuditRepository) -> Self {
        Self {
            audit_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an audit entry for a completed action.
    pub async fn record_action(
        &self,
        actor_id: &str,
        action: &str,
        target_type: &str,
        target_id: &str,
    ) -> AppResult<audit_log::Model> {
        self.audit_repo
            .record(
                self.id_gen.generate(),
                actor_id,
                action,
                target_type,
                target_id,
            )
            .await
    }

    /// List audit entries, newest first. Super-admin only.
    pub async fn list_entries(
        &self,
        actor: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<audit_log::Model>> {
        policy::require_audit_access(actor)?;
        self.audit_repo.list(limit, offset).await
    }

    /// Raise a fraud flag when a detection rule fires.
    ///
    /// Called by other services, not by end users; review is super-admin
    /// only.
    pub async fn raise_flag(
        &self,
        entity_type: &str,
        entity_id: &str,
        rule: &str,
        score: i32,
    ) -> AppResult<fraud_flag::Model> {
        let model = fraud_flag::ActiveModel {
            id: Set(self.id_gen.generate()),
            entity_type: Set(entity_type.to_string()),
            entity_id: Set(entity_id.to_string()),
            rule: Set(rule.to_string()),
            score: Set(score),
            resolved: Set(false),
            resolved_by: Set(None),
            created_at: Set(Utc::now().into()),
        };

        self.audit_repo.create_flag(model).await
    }

    /// List unresolved fraud flags, newest first. Super-admin only.
    pub async fn list_open_flags(
        &self,
        actor: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<fraud_flag::Model>> {
        policy::require_audit_access(actor)?;
        self.audit_repo.list_unresolved(limit, offset).await
    }

    /// Resolve a fraud flag. Super-admin only.
    pub async fn resolve_flag(&self, actor: &user::Model, flag_id: &str) -> AppResult<()> {
        policy::require_audit_access(actor)?;

        let rows = self.audit_repo.resolve_flag(flag_id, &actor.id).await?;
        if rows == 0 {
            return Err(AppError::NotFoundOrIneligible(format!(
                "Flag {flag_id} is missing or already resolved"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proplet_db::entities::user::UserRole;
    use proplet_db::test_utils::mock_admin;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_audit_surface_is_super_admin_only() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = AuditService::new(AuditRepository::new(db));

        let admin = mock_admin("admin1", UserRole::Admin);
        let result = svc.list_entries(&admin, 10, 0).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_resolve_flag_twice_is_an_error() {
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
        let svc = AuditService::new(AuditRepository::new(db));

        let root = mock_admin("root1", UserRole::SuperAdmin);
        assert!(svc.resolve_flag(&root, "flag1").await.is_ok());
        assert!(matches!(
            svc.resolve_flag(&root, "flag1").await,
            Err(AppError::NotFoundOrIneligible(_))
        ));
    }
}
