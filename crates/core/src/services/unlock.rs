//! Pay-to-unlock flow for single properties.
//!
//! A tenant without a subscription can buy permanent access to one listing's
//! protected fields. The flow is two-legged: `initialize` creates a pending
//! record and a provider checkout session; `verify` runs after the redirect
//! back and promotes the record once the provider confirms the charge.

use chrono::Utc;
use proplet_common::{AppError, AppResult, IdGenerator, config::PaymentConfig};
use proplet_db::entities::{
    property::PropertyStatus,
    property_unlock::{self, UnlockStatus},
    user::{self, UserRole},
};
use proplet_db::repositories::{PropertyRepository, UnlockRepository};
use sea_orm::Set;
use std::sync::Arc;
use tracing::{info, warn};

use super::payment::{ChargeStatus, PaymentProvider};

/// Result of an unlock initialization.
#[derive(Debug, Clone)]
pub enum InitializeOutcome {
    /// The pair already holds a confirmed unlock; no charge was created.
    AlreadyUnlocked,
    /// Send the payer to the provider's checkout page.
    Checkout {
        authorization_url: String,
        reference: String,
    },
}

/// Result of an unlock verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The unlock is confirmed (by this call or a concurrent one).
    Unlocked,
    /// The provider has not confirmed the charge; the record stays pending
    /// and verification can be retried.
    Pending,
}

/// Service for the pay-to-unlock flow.
#[derive(Clone)]
pub struct UnlockService {
    unlock_repo: UnlockRepository,
    property_repo: PropertyRepository,
    provider: Arc<dyn PaymentProvider>,
    payment: PaymentConfig,
    id_gen: IdGenerator,
}

impl UnlockService {
    /// Create a new unlock service.
    #[must_use]
    pub fn new(
        unlock_repo: UnlockRepository,
        property_repo: PropertyRepository,
        provider: Arc<dyn PaymentProvider>,
        payment: PaymentConfig,
    ) -> Self {
        Self {
            unlock_repo,
            property_repo,
            provider,
            payment,
            id_gen: IdGenerator::new(),
        }
    }

    /// Start a charge for one property's protected fields.
    ///
    /// Only verified tenants may pay; an unverified tenant gets an error
    /// carrying the path to resume from after verification. An existing
    /// pending record for the pair is reused, so abandoning checkout and
    /// retrying does not pile up references.
    pub async fn initialize(
        &self,
        user: &user::Model,
        property_id: &str,
    ) -> AppResult<InitializeOutcome> {
        if user.user_type != UserRole::Tenant {
            return Err(AppError::Forbidden(
                "Only tenants can unlock properties".to_string(),
            ));
        }

        if !user.identity_verified {
            return Err(AppError::IdentityNotVerified {
                resume: format!("/api/properties/{property_id}/unlock"),
            });
        }

        let property = self.property_repo.get_by_id(property_id).await?;
        if property.status != PropertyStatus::Approved {
            // Unapproved listings are invisible; do not leak their existence.
            return Err(AppError::NotFound(format!(
                "Property not found: {property_id}"
            )));
        }

        let record = match self.unlock_repo.find_by_pair(&user.id, property_id).await? {
            Some(existing) if existing.status == UnlockStatus::Unlocked => {
                return Ok(InitializeOutcome::AlreadyUnlocked);
            }
            Some(pending) => pending,
            None => {
                let model = property_unlock::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user.id.clone()),
                    property_id: Set(property_id.to_string()),
                    reference: Set(self.id_gen.generate_reference()),
                    amount: Set(self.payment.unlock_amount),
                    status: Set(UnlockStatus::Pending),
                    created_at: Set(Utc::now().into()),
                    unlocked_at: Set(None),
                };
                match self.unlock_repo.create_if_absent(model).await? {
                    Some(created) => created,
                    // Lost the insert race to a concurrent initialize; the
                    // surviving row is authoritative for the pair.
                    None => {
                        let survivor = self
                            .unlock_repo
                            .find_by_pair(&user.id, property_id)
                            .await?
                            .ok_or_else(|| {
                                AppError::Database(format!(
                                    "No unlock row for ({}, {property_id}) after insert conflict",
                                    user.id
                                ))
                            })?;
                        if survivor.status == UnlockStatus::Unlocked {
                            return Ok(InitializeOutcome::AlreadyUnlocked);
                        }
                        survivor
                    }
                }
            }
        };

        let session = self
            .provider
            .initialize_charge(&record.reference, record.amount, &user.email)
            .await?;

        info!(
            user_id = %user.id,
            property_id = %property_id,
            reference = %session.reference,
            "Initialized unlock charge"
        );

        Ok(InitializeOutcome::Checkout {
            authorization_url: session.authorization_url,
            reference: session.reference,
        })
    }

    /// Verify a charge after the redirect back from checkout.
    ///
    /// Idempotent: replayed redirects and concurrent verifications all
    /// converge on `Unlocked` once the provider confirms. A failed or
    /// still-processing charge leaves the record pending.
    pub async fn verify(&self, reference: &str) -> AppResult<VerifyOutcome> {
        let record = self
            .unlock_repo
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown reference: {reference}")))?;

        if record.status == UnlockStatus::Unlocked {
            return Ok(VerifyOutcome::Unlocked);
        }

        match self.provider.confirm_charge(reference).await? {
            ChargeStatus::Succeeded => {
                // Zero rows means a concurrent verification won the promote;
                // the outcome is the same either way.
                let rows = self.unlock_repo.promote(reference).await?;
                info!(reference = %reference, promoted = rows > 0, "Unlock confirmed");
                Ok(VerifyOutcome::Unlocked)
            }
            ChargeStatus::Failed => {
                warn!(reference = %reference, "Charge failed at the provider");
                Ok(VerifyOutcome::Pending)
            }
            ChargeStatus::Pending => Ok(VerifyOutcome::Pending),
        }
    }

    /// List a tenant's unlock history, newest first.
    pub async fn list_for_user(
        &self,
        user: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<property_unlock::Model>> {
        self.unlock_repo.list_for_user(&user.id, limit, offset).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::payment::ChargeSession;
    use async_trait::async_trait;
    use proplet_db::test_utils::{mock_property, mock_tenant, mock_unlock};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    struct StubProvider {
        confirm: ChargeStatus,
    }

    #[async_trait]
    impl PaymentProvider for StubProvider {
        async fn initialize_charge(
            &self,
            reference: &str,
            _amount: i64,
            _email: &str,
        ) -> AppResult<ChargeSession> {
            Ok(ChargeSession {
                authorization_url: format!("https://checkout.example/{reference}"),
                reference: reference.to_string(),
            })
        }

        async fn confirm_charge(&self, _reference: &str) -> AppResult<ChargeStatus> {
            Ok(self.confirm)
        }
    }

    fn payment_config() -> PaymentConfig {
        PaymentConfig {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: "sk_test".to_string(),
            unlock_amount: 5_000,
            currency: "NGN".to_string(),
            return_url: "https://proplet.example/unlocks/verify".to_string(),
            timeout_secs: 15,
        }
    }

    fn service(
        db: Arc<sea_orm::DatabaseConnection>,
        confirm: ChargeStatus,
    ) -> UnlockService {
        UnlockService::new(
            UnlockRepository::new(db.clone()),
            PropertyRepository::new(db),
            Arc::new(StubProvider { confirm }),
            payment_config(),
        )
    }

    #[tokio::test]
    async fn test_initialize_requires_verified_identity() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db, ChargeStatus::Succeeded);

        let unverified = mock_tenant("user1");
        let result = svc.initialize(&unverified, "prop1").await;

        match result {
            Err(AppError::IdentityNotVerified { resume }) => {
                assert_eq!(resume, "/api/properties/prop1/unlock");
            }
            other => panic!("expected IdentityNotVerified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_initialize_reuses_pending_record() {
        let property = mock_property("prop1", "landlord1");
        let pending = mock_unlock("u1", "user1", "prop1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[property]])
                .append_query_results([[pending.clone()]])
                .into_connection(),
        );

        let svc = service(db, ChargeStatus::Succeeded);
        let mut tenant = mock_tenant("user1");
        tenant.identity_verified = true;

        let outcome = svc.initialize(&tenant, "prop1").await.unwrap();
        match outcome {
            InitializeOutcome::Checkout { reference, .. } => {
                assert_eq!(reference, pending.reference);
            }
            InitializeOutcome::AlreadyUnlocked => panic!("expected a checkout session"),
        }
    }

    #[tokio::test]
    async fn test_initialize_race_converges_on_one_pending_charge() {
        let property = mock_property("prop1", "landlord1");
        let survivor = mock_unlock("u1", "user1", "prop1");

        // This call's pair lookup sees nothing, its insert then hits the
        // unique pair index, and the re-read returns the row the concurrent
        // initialize created. Only that row's reference is ever charged.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[property]])
                .append_query_results([Vec::<property_unlock::Model>::new()])
                .append_query_results([Vec::<property_unlock::Model>::new()])
                .append_query_results([[survivor.clone()]])
                .into_connection(),
        );

        let svc = service(db, ChargeStatus::Succeeded);
        let mut tenant = mock_tenant("user1");
        tenant.identity_verified = true;

        let outcome = svc.initialize(&tenant, "prop1").await.unwrap();
        match outcome {
            InitializeOutcome::Checkout { reference, .. } => {
                assert_eq!(reference, survivor.reference);
            }
            InitializeOutcome::AlreadyUnlocked => panic!("expected a checkout session"),
        }
    }

    #[tokio::test]
    async fn test_initialize_short_circuits_on_existing_unlock() {
        let property = mock_property("prop1", "landlord1");
        let mut unlocked = mock_unlock("u1", "user1", "prop1");
        unlocked.status = UnlockStatus::Unlocked;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[property]])
                .append_query_results([[unlocked]])
                .into_connection(),
        );

        let svc = service(db, ChargeStatus::Succeeded);
        let mut tenant = mock_tenant("user1");
        tenant.identity_verified = true;

        let outcome = svc.initialize(&tenant, "prop1").await.unwrap();
        assert!(matches!(outcome, InitializeOutcome::AlreadyUnlocked));
    }

    #[tokio::test]
    async fn test_verify_promotes_on_success() {
        let pending = mock_unlock("u1", "user1", "prop1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let svc = service(db, ChargeStatus::Succeeded);
        let outcome = svc.verify("plt_u1").await.unwrap();

        assert_eq!(outcome, VerifyOutcome::Unlocked);
    }

    #[tokio::test]
    async fn test_verify_is_idempotent_once_unlocked() {
        let mut unlocked = mock_unlock("u1", "user1", "prop1");
        unlocked.status = UnlockStatus::Unlocked;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[unlocked]])
                .into_connection(),
        );

        // No provider call, no UPDATE: the record is already terminal.
        let svc = service(db, ChargeStatus::Failed);
        let outcome = svc.verify("plt_u1").await.unwrap();

        assert_eq!(outcome, VerifyOutcome::Unlocked);
    }

    #[tokio::test]
    async fn test_verify_leaves_failed_charge_pending() {
        let pending = mock_unlock("u1", "user1", "prop1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .into_connection(),
        );

        let svc = service(db, ChargeStatus::Failed);
        let outcome = svc.verify("plt_u1").await.unwrap();

        assert_eq!(outcome, VerifyOutcome::Pending);
    }
}
