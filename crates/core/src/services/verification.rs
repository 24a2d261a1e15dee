//! Identity verification workflow.
//!
//! Governs the document lifecycle: unsubmitted, submitted pending review,
//! verified. Rejection clears the uploaded photo and verifier metadata, so a
//! rejected user drops back to unsubmitted until a fresh photo arrives; this
//! forced resubmission is a deliberate anti-fraud measure.

use chrono::Utc;
use once_cell::sync::Lazy;
use proplet_common::{AppError, AppResult};
use proplet_db::entities::user::{self, DocumentType, UserRole};
use proplet_db::repositories::{AuditRepository, UserRepository};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use tracing::warn;

use super::audit::AuditService;
use super::policy;

/// Flag score for a rejected identity document.
const REJECTED_DOCUMENT_SCORE: i32 = 25;

/// NIN: exactly 11 digits.
static NIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{11}$").unwrap_or_else(|_| unreachable!()));

/// Passport: 6-20 alphanumeric characters.
static PASSPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{6,20}$").unwrap_or_else(|_| unreachable!()));

/// Derived position in the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// No complete submission on file (includes post-rejection).
    Unsubmitted,
    /// Complete submission awaiting admin review.
    PendingReview,
    /// Approved by an admin.
    Verified,
}

/// Input for a document submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDocumentsInput {
    pub document_type: DocumentType,
    pub document_number: String,
    /// Required when `document_type` is passport.
    pub nationality: Option<String>,
    pub photo_url: String,
}

/// Service for the identity verification workflow.
#[derive(Clone)]
pub struct VerificationService {
    user_repo: UserRepository,
    audit: AuditService,
}

impl VerificationService {
    /// Create a new verification service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, audit_repo: AuditRepository) -> Self {
        Self {
            user_repo,
            audit: AuditService::new(audit_repo),
        }
    }

    /// Validate a document number against its type's format.
    pub fn validate_document(
        document_type: DocumentType,
        document_number: &str,
        nationality: Option<&str>,
    ) -> AppResult<()> {
        match document_type {
            DocumentType::NationalId => {
                if !NIN_RE.is_match(document_number) {
                    return Err(AppError::Validation(
                        "NIN must be exactly 11 digits".to_string(),
                    ));
                }
            }
            DocumentType::Passport => {
                if !PASSPORT_RE.is_match(document_number) {
                    return Err(AppError::Validation(
                        "Passport number must be 6-20 alphanumeric characters".to_string(),
                    ));
                }
                if nationality.is_none_or(|n| n.trim().is_empty()) {
                    return Err(AppError::Validation(
                        "Nationality is required for passport submissions".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Derive the verification state from a user record.
    #[must_use]
    pub fn state_of(user: &user::Model) -> VerificationState {
        if user.identity_verified {
            VerificationState::Verified
        } else if Self::is_reviewable(user) {
            VerificationState::PendingReview
        } else {
            VerificationState::Unsubmitted
        }
    }

    /// Whether the record satisfies the review-queue eligibility predicate.
    #[must_use]
    pub fn is_reviewable(user: &user::Model) -> bool {
        !user.identity_verified
            && user.identity_photo_url.is_some()
            && user.document_number.is_some()
            && user.email_verified
            && user.phone_verified
            && user.deleted_at.is_none()
            && matches!(user.user_type, UserRole::Tenant | UserRole::Landlord)
    }

    /// Submit identity documents.
    ///
    /// Persists the document fields and stamps the submission time; never
    /// touches the verified flag.
    pub async fn submit_documents(
        &self,
        user_id: &str,
        input: SubmitDocumentsInput,
    ) -> AppResult<user::Model> {
        Self::validate_document(
            input.document_type,
            &input.document_number,
            input.nationality.as_deref(),
        )?;

        if input.photo_url.trim().is_empty() {
            return Err(AppError::Validation(
                "A document photo is required".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.document_type = Set(Some(input.document_type));
        active.document_number = Set(Some(input.document_number));
        active.nationality = Set(input.nationality);
        active.identity_photo_url = Set(Some(input.photo_url));
        active.identity_submitted_at = Set(Some(Utc::now().into()));
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// List identities awaiting review, earliest submissions first.
    pub async fn list_pending(
        &self,
        actor: &user::Model,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        if !policy::is_staff(actor.user_type) {
            return Err(AppError::Forbidden(
                "Only admins can review identities".to_string(),
            ));
        }

        self.user_repo
            .find_pending_review(search, limit, offset)
            .await
    }

    /// Count identities awaiting review.
    pub async fn count_pending(
        &self,
        actor: &user::Model,
        search: Option<&str>,
    ) -> AppResult<u64> {
        if !policy::is_staff(actor.user_type) {
            return Err(AppError::Forbidden(
                "Only admins can review identities".to_string(),
            ));
        }

        self.user_repo.count_pending_review(search).await
    }

    /// Approve an identity.
    ///
    /// The eligibility predicate is re-checked inside the UPDATE, so an
    /// already-verified or concurrently-approved record yields
    /// `NotFoundOrIneligible` rather than a silent success.
    pub async fn approve(&self, actor: &user::Model, user_id: &str) -> AppResult<()> {
        let target = self.user_repo.get_by_id(user_id).await?;
        policy::require_identity_moderation(actor, &target)?;

        let rows = self.user_repo.approve_identity(user_id, &actor.id).await?;
        if rows == 0 {
            return Err(AppError::NotFoundOrIneligible(format!(
                "Identity {user_id} is not pending review"
            )));
        }

        self.audit(&actor.id, "identity.approve", user_id).await;
        Ok(())
    }

    /// Reject an identity: clear the photo and verifier metadata.
    ///
    /// Succeeds for any existing tenant or landlord; the user must submit a
    /// fresh photo to re-enter the queue. Each rejection also raises a fraud
    /// flag so repeat offenders surface in the super-admin review.
    pub async fn reject(&self, actor: &user::Model, user_id: &str) -> AppResult<()> {
        let target = self.user_repo.get_by_id(user_id).await?;

        if !matches!(target.user_type, UserRole::Tenant | UserRole::Landlord) {
            return Err(AppError::NotFound(format!(
                "No reviewable identity for user {user_id}"
            )));
        }
        policy::require_identity_moderation(actor, &target)?;

        self.user_repo.reject_identity(user_id).await?;

        self.audit(&actor.id, "identity.reject", user_id).await;
        self.flag(user_id, "identity.document_rejected", REJECTED_DOCUMENT_SCORE)
            .await;
        Ok(())
    }

    /// Append an audit entry; failures are logged, not surfaced.
    async fn audit(&self, actor_id: &str, action: &str, target_id: &str) {
        if let Err(e) = self
            .audit
            .record_action(actor_id, action, "user", target_id)
            .await
        {
            warn!(error = %e, action = action, target_id = target_id, "Failed to write audit entry");
        }
    }

    /// Raise a fraud flag; failures are logged, not surfaced.
    async fn flag(&self, user_id: &str, rule: &str, score: i32) {
        if let Err(e) = self.audit.raise_flag("user", user_id, rule, score).await {
            warn!(error = %e, rule = rule, user_id = user_id, "Failed to raise fraud flag");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proplet_db::test_utils::{mock_admin, mock_tenant};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> VerificationService {
        VerificationService::new(
            UserRepository::new(db.clone()),
            AuditRepository::new(db),
        )
    }

    #[test]
    fn test_validate_nin() {
        assert!(
            VerificationService::validate_document(DocumentType::NationalId, "12345678901", None)
                .is_ok()
        );
        assert!(
            VerificationService::validate_document(DocumentType::NationalId, "1234567890", None)
                .is_err()
        );
        assert!(
            VerificationService::validate_document(DocumentType::NationalId, "1234567890a", None)
                .is_err()
        );
    }

    #[test]
    fn test_validate_passport() {
        assert!(
            VerificationService::validate_document(
                DocumentType::Passport,
                "A1234567",
                Some("Nigerian")
            )
            .is_ok()
        );
        // Nationality required for passports.
        assert!(
            VerificationService::validate_document(DocumentType::Passport, "A1234567", None)
                .is_err()
        );
        // Too short.
        assert!(
            VerificationService::validate_document(
                DocumentType::Passport,
                "A1234",
                Some("Nigerian")
            )
            .is_err()
        );
    }

    #[test]
    fn test_state_derivation() {
        let mut user = mock_tenant("user1");
        assert_eq!(
            VerificationService::state_of(&user),
            VerificationState::PendingReview
        );

        user.identity_verified = true;
        assert_eq!(
            VerificationService::state_of(&user),
            VerificationState::Verified
        );

        // Rejection clears the photo; the user drops back to unsubmitted.
        user.identity_verified = false;
        user.identity_photo_url = None;
        assert_eq!(
            VerificationService::state_of(&user),
            VerificationState::Unsubmitted
        );
    }

    #[test]
    fn test_reviewable_requires_contact_verification() {
        let mut user = mock_tenant("user1");
        assert!(VerificationService::is_reviewable(&user));

        user.phone_verified = false;
        assert!(!VerificationService::is_reviewable(&user));
    }

    #[tokio::test]
    async fn test_approve_ineligible_is_an_error() {
        let mut verified = mock_tenant("user1");
        verified.identity_verified = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[verified]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let svc = service(db);
        let admin = mock_admin("admin1", UserRole::Admin);

        let result = svc.approve(&admin, "user1").await;
        assert!(matches!(result, Err(AppError::NotFoundOrIneligible(_))));
    }

    #[tokio::test]
    async fn test_admin_cannot_approve_super_admin() {
        let target = mock_admin("root1", UserRole::SuperAdmin);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[target]])
                .into_connection(),
        );

        let svc = service(db);
        let admin = mock_admin("admin1", UserRole::Admin);

        let result = svc.approve(&admin, "root1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_reject_raises_fraud_flag() {
        use proplet_db::entities::{audit_log, fraud_flag};

        let target = mock_tenant("user1");
        let audit_entry = audit_log::Model {
            id: "a1".to_string(),
            actor_id: "admin1".to_string(),
            action: "identity.reject".to_string(),
            target_type: "user".to_string(),
            target_id: "user1".to_string(),
            created_at: Utc::now().into(),
        };
        let flag = fraud_flag::Model {
            id: "f1".to_string(),
            entity_type: "user".to_string(),
            entity_id: "user1".to_string(),
            rule: "identity.document_rejected".to_string(),
            score: 25,
            resolved: false,
            resolved_by: None,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[target]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[audit_entry]])
                .append_query_results([[flag]])
                .into_connection(),
        );

        let svc = service(db.clone());
        let admin = mock_admin("admin1", UserRole::Admin);
        svc.reject(&admin, "user1").await.unwrap();

        drop(svc);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(
            log.iter()
                .any(|txn| format!("{txn:?}").contains("fraud_flag"))
        );
    }

    #[tokio::test]
    async fn test_reject_non_reviewable_role_is_not_found() {
        let target = mock_admin("admin2", UserRole::Admin);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[target]])
                .into_connection(),
        );

        let svc = service(db);
        let root = mock_admin("root1", UserRole::SuperAdmin);

        let result = svc.reject(&root, "admin2").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_pending_requires_staff() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let tenant = mock_tenant("user1");
        let result = svc.list_pending(&tenant, None, 10, 0).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
