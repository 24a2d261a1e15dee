//! Listing submission and moderation.
//!
//! Landlords submit listings into a pending queue; admins approve or reject
//! them. Approval is the event that triggers alert dispatch, synchronously
//! in the same request so the moderation response can report how many alerts
//! fired.

use chrono::Utc;
use proplet_common::{AppError, AppResult, IdGenerator};
use proplet_db::entities::{
    property::{self, PropertyStatus},
    user::{self, UserRole},
};
use proplet_db::repositories::{AuditRepository, PropertyRepository};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::Value as Json;
use tracing::warn;

use super::alert::{AlertService, DispatchSummary};
use super::audit::AuditService;
use super::policy;

/// Flag score for a rejected listing.
const REJECTED_LISTING_SCORE: i32 = 40;

/// Input for submitting a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitListingInput {
    pub title: String,
    pub property_type: String,
    pub state: String,
    pub city: String,
    pub rent_amount: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub full_address: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub video_url: Option<String>,
}

/// Service for listing submission and moderation.
#[derive(Clone)]
pub struct ListingService {
    property_repo: PropertyRepository,
    audit: AuditService,
    alerts: AlertService,
    id_gen: IdGenerator,
}

impl ListingService {
    /// Create a new listing service.
    #[must_use]
    pub fn new(
        property_repo: PropertyRepository,
        audit_repo: AuditRepository,
        alerts: AlertService,
    ) -> Self {
        Self {
            property_repo,
            audit: AuditService::new(audit_repo),
            alerts,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a new listing into the moderation queue.
    ///
    /// Only identity-verified landlords can list; an unverified landlord is
    /// told where to resume after verification.
    pub async fn submit(
        &self,
        landlord: &user::Model,
        input: SubmitListingInput,
    ) -> AppResult<property::Model> {
        if landlord.user_type != UserRole::Landlord {
            return Err(AppError::Forbidden(
                "Only landlords can list properties".to_string(),
            ));
        }

        if !landlord.identity_verified {
            return Err(AppError::IdentityNotVerified {
                resume: "/api/properties".to_string(),
            });
        }

        Self::validate(&input)?;

        let model = property::ActiveModel {
            id: Set(self.id_gen.generate()),
            landlord_id: Set(landlord.id.clone()),
            title: Set(input.title.trim().to_string()),
            property_type: Set(input.property_type.trim().to_lowercase()),
            state: Set(input.state.trim().to_string()),
            city: Set(input.city.trim().to_string()),
            rent_amount: Set(input.rent_amount),
            bedrooms: Set(input.bedrooms),
            bathrooms: Set(input.bathrooms),
            rating: Set(None),
            full_address: Set(input.full_address.trim().to_string()),
            amenities: Set(Json::from(input.amenities)),
            video_url: Set(input.video_url),
            status: Set(PropertyStatus::Pending),
            moderated_by: Set(None),
            moderated_at: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.property_repo.create(model).await
    }

    fn validate(input: &SubmitListingInput) -> AppResult<()> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("A title is required".to_string()));
        }
        if input.property_type.trim().is_empty() {
            return Err(AppError::Validation(
                "A property type is required".to_string(),
            ));
        }
        if input.full_address.trim().is_empty() {
            return Err(AppError::Validation(
                "A full address is required".to_string(),
            ));
        }
        if input.rent_amount <= 0 {
            return Err(AppError::Validation(
                "Rent must be a positive amount".to_string(),
            ));
        }
        if input.bedrooms < 0 || input.bathrooms < 0 {
            return Err(AppError::Validation(
                "Room counts cannot be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Approve a pending listing, then dispatch matching alerts.
    ///
    /// The approval is the conditional UPDATE; when two admins race, the
    /// loser gets `NotFoundOrIneligible` and no alerts fire twice (dispatch
    /// claims each alert at most once regardless).
    pub async fn approve(
        &self,
        actor: &user::Model,
        property_id: &str,
    ) -> AppResult<(property::Model, DispatchSummary)> {
        policy::require_listing_moderation(actor)?;

        let rows = self.property_repo.approve(property_id, &actor.id).await?;
        if rows == 0 {
            return Err(AppError::NotFoundOrIneligible(format!(
                "Listing {property_id} is not pending moderation"
            )));
        }

        self.audit(&actor.id, "listing.approve", property_id).await;

        let property = self.property_repo.get_by_id(property_id).await?;
        let summary = self.alerts.dispatch_for_property(&property).await?;

        Ok((property, summary))
    }

    /// Reject a pending listing.
    ///
    /// Also raises a fraud flag against the listing so a landlord whose
    /// submissions keep bouncing accumulates a visible record.
    pub async fn reject(&self, actor: &user::Model, property_id: &str) -> AppResult<()> {
        policy::require_listing_moderation(actor)?;

        let rows = self.property_repo.reject(property_id, &actor.id).await?;
        if rows == 0 {
            return Err(AppError::NotFoundOrIneligible(format!(
                "Listing {property_id} is not pending moderation"
            )));
        }

        self.audit(&actor.id, "listing.reject", property_id).await;
        self.flag(property_id, "listing.rejected", REJECTED_LISTING_SCORE)
            .await;
        Ok(())
    }

    /// List the moderation queue, oldest first.
    pub async fn list_pending(
        &self,
        actor: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<property::Model>> {
        policy::require_listing_moderation(actor)?;
        self.property_repo.list_pending(limit, offset).await
    }

    /// List a landlord's own listings, newest first.
    pub async fn list_own(
        &self,
        landlord: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<property::Model>> {
        self.property_repo
            .list_for_landlord(&landlord.id, limit, offset)
            .await
    }

    async fn audit(&self, actor_id: &str, action: &str, target_id: &str) {
        if let Err(e) = self
            .audit
            .record_action(actor_id, action, "property", target_id)
            .await
        {
            warn!(error = %e, action = action, target_id = target_id, "Failed to write audit entry");
        }
    }

    /// Raise a fraud flag; failures are logged, not surfaced.
    async fn flag(&self, property_id: &str, rule: &str, score: i32) {
        if let Err(e) = self
            .audit
            .raise_flag("property", property_id, rule, score)
            .await
        {
            warn!(error = %e, rule = rule, property_id = property_id, "Failed to raise fraud flag");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::email::EmailSender;
    use crate::services::whatsapp::WhatsAppSender;
    use proplet_db::repositories::AlertRepository;
    use proplet_db::test_utils::{mock_admin, mock_tenant};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    struct NullEmail;

    #[async_trait::async_trait]
    impl EmailSender for NullEmail {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> AppResult<()> {
            Ok(())
        }
    }

    struct NullWhatsApp;

    #[async_trait::async_trait]
    impl WhatsAppSender for NullWhatsApp {
        async fn send_text(&self, _phone: &str, _body: &str) -> AppResult<()> {
            Ok(())
        }
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> ListingService {
        ListingService::new(
            PropertyRepository::new(db.clone()),
            AuditRepository::new(db.clone()),
            AlertService::new(
                AlertRepository::new(db),
                Arc::new(NullEmail),
                Arc::new(NullWhatsApp),
            ),
        )
    }

    fn listing_input() -> SubmitListingInput {
        SubmitListingInput {
            title: "2-bed apartment, Lekki Phase 1".to_string(),
            property_type: "apartment".to_string(),
            state: "Lagos".to_string(),
            city: "Lekki".to_string(),
            rent_amount: 750_000,
            bedrooms: 2,
            bathrooms: 2,
            full_address: "12 Admiralty Way".to_string(),
            amenities: vec!["parking".to_string()],
            video_url: None,
        }
    }

    #[tokio::test]
    async fn test_submit_requires_landlord_role() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let tenant = mock_tenant("user1");
        let result = svc.submit(&tenant, listing_input()).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_submit_requires_verified_identity() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let mut landlord = mock_tenant("landlord1");
        landlord.user_type = UserRole::Landlord;

        let result = svc.submit(&landlord, listing_input()).await;
        assert!(matches!(result, Err(AppError::IdentityNotVerified { .. })));
    }

    #[test]
    fn test_validate_rejects_nonpositive_rent() {
        let mut input = listing_input();
        input.rent_amount = 0;
        assert!(matches!(
            ListingService::validate(&input),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_moderation_requires_staff() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let tenant = mock_tenant("user1");
        assert!(matches!(
            svc.approve(&tenant, "prop1").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            svc.reject(&tenant, "prop1").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_reject_raises_fraud_flag() {
        use proplet_db::entities::{audit_log, fraud_flag};

        let audit_entry = audit_log::Model {
            id: "a1".to_string(),
            actor_id: "admin1".to_string(),
            action: "listing.reject".to_string(),
            target_type: "property".to_string(),
            target_id: "prop1".to_string(),
            created_at: Utc::now().into(),
        };
        let flag = fraud_flag::Model {
            id: "f1".to_string(),
            entity_type: "property".to_string(),
            entity_id: "prop1".to_string(),
            rule: "listing.rejected".to_string(),
            score: 40,
            resolved: false,
            resolved_by: None,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([sea_orm::MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[audit_entry]])
                .append_query_results([[flag]])
                .into_connection(),
        );

        let svc = service(db.clone());
        let admin = mock_admin("admin1", UserRole::Admin);
        svc.reject(&admin, "prop1").await.unwrap();

        drop(svc);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(
            log.iter()
                .any(|txn| format!("{txn:?}").contains("fraud_flag"))
        );
    }

    #[tokio::test]
    async fn test_approve_already_decided_is_an_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([sea_orm::MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let admin = mock_admin("admin1", UserRole::Admin);
        let result = svc.approve(&admin, "prop1").await;

        assert!(matches!(result, Err(AppError::NotFoundOrIneligible(_))));
    }
}
