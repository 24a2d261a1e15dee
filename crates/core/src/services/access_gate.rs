//! Paid-access gate for protected listing fields.
//!
//! The full view of a listing (exact address, amenities, video tour, and the
//! landlord's contact details) is entitlement-gated. The stored
//! `subscription_active` flag is treated as a hint only: the gate re-checks
//! the expiry timestamp on every evaluation, so a lapsed subscription loses
//! access the moment it expires, not when the nightly sweep catches up.

use chrono::{DateTime, Utc};
use proplet_common::AppResult;
use proplet_db::entities::{
    property,
    user::{self, UserRole},
};
use proplet_db::repositories::UnlockRepository;

use super::policy;

/// How much of a listing the viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Public fields only.
    PublicView,
    /// All fields, including protected ones and landlord contact details.
    FullView,
}

/// Evaluates viewer entitlements against a listing.
#[derive(Clone)]
pub struct AccessGate {
    unlock_repo: UnlockRepository,
}

impl AccessGate {
    /// Create a new access gate.
    #[must_use]
    pub const fn new(unlock_repo: UnlockRepository) -> Self {
        Self { unlock_repo }
    }

    /// Whether the user holds a subscription that is valid right now.
    #[must_use]
    pub fn has_active_subscription(user: &user::Model, now: DateTime<Utc>) -> bool {
        user.subscription_active
            && user
                .subscription_expires_at
                .is_some_and(|expires| expires > now)
    }

    /// Decide how much of `property` the viewer may see.
    ///
    /// Staff and the owning landlord always get the full view. A tenant gets
    /// it with a currently-valid subscription or a confirmed per-property
    /// unlock. Everyone else, anonymous viewers included, gets the public
    /// view; an insufficient entitlement is never an error.
    pub async fn evaluate(
        &self,
        viewer: Option<&user::Model>,
        property: &property::Model,
    ) -> AppResult<AccessDecision> {
        let Some(viewer) = viewer else {
            return Ok(AccessDecision::PublicView);
        };

        if policy::is_staff(viewer.user_type) || viewer.id == property.landlord_id {
            return Ok(AccessDecision::FullView);
        }

        if viewer.user_type != UserRole::Tenant {
            return Ok(AccessDecision::PublicView);
        }

        if Self::has_active_subscription(viewer, Utc::now()) {
            return Ok(AccessDecision::FullView);
        }

        // Subscription check is free; only fall through to the unlock lookup
        // when it fails.
        if self.unlock_repo.has_unlocked(&viewer.id, &property.id).await? {
            return Ok(AccessDecision::FullView);
        }

        Ok(AccessDecision::PublicView)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proplet_db::test_utils::{mock_admin, mock_property, mock_tenant};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn count_result(n: i64) -> Vec<std::collections::BTreeMap<&'static str, sea_orm::Value>> {
        vec![maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }]
    }

    #[test]
    fn test_subscription_flag_alone_is_not_enough() {
        let now = Utc::now();

        let mut user = mock_tenant("user1");
        user.subscription_active = true;
        user.subscription_expires_at = Some((now - Duration::days(1)).into());

        // Flag still true but the timestamp has passed: no access.
        assert!(!AccessGate::has_active_subscription(&user, now));

        user.subscription_expires_at = Some((now + Duration::days(30)).into());
        assert!(AccessGate::has_active_subscription(&user, now));
    }

    #[tokio::test]
    async fn test_anonymous_gets_public_view() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let gate = AccessGate::new(UnlockRepository::new(db));

        let property = mock_property("prop1", "landlord1");
        let decision = gate.evaluate(None, &property).await.unwrap();

        assert_eq!(decision, AccessDecision::PublicView);
    }

    #[tokio::test]
    async fn test_owning_landlord_gets_full_view() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let gate = AccessGate::new(UnlockRepository::new(db));

        let mut landlord = mock_tenant("landlord1");
        landlord.user_type = UserRole::Landlord;
        let property = mock_property("prop1", "landlord1");

        let decision = gate.evaluate(Some(&landlord), &property).await.unwrap();
        assert_eq!(decision, AccessDecision::FullView);
    }

    #[tokio::test]
    async fn test_staff_gets_full_view() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let gate = AccessGate::new(UnlockRepository::new(db));

        let admin = mock_admin("admin1", UserRole::Admin);
        let property = mock_property("prop1", "landlord1");

        let decision = gate.evaluate(Some(&admin), &property).await.unwrap();
        assert_eq!(decision, AccessDecision::FullView);
    }

    #[tokio::test]
    async fn test_tenant_with_unlock_gets_full_view() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_result(1)])
                .into_connection(),
        );
        let gate = AccessGate::new(UnlockRepository::new(db));

        let tenant = mock_tenant("user1");
        let property = mock_property("prop1", "landlord1");

        let decision = gate.evaluate(Some(&tenant), &property).await.unwrap();
        assert_eq!(decision, AccessDecision::FullView);
    }

    #[tokio::test]
    async fn test_tenant_without_entitlement_gets_public_view() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_result(0)])
                .into_connection(),
        );
        let gate = AccessGate::new(UnlockRepository::new(db));

        let tenant = mock_tenant("user1");
        let property = mock_property("prop1", "landlord1");

        let decision = gate.evaluate(Some(&tenant), &property).await.unwrap();
        assert_eq!(decision, AccessDecision::PublicView);
    }
}
