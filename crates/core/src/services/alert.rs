//! Property alerts: registration, matching, and dispatch.
//!
//! An alert is a standing request matched against listings as they are
//! approved. Matching is two-stage: the repository pulls the coarse
//! candidate set (open alerts for the listing's type) and the matcher
//! applies the remaining criteria per alert in memory. An alert fires at
//! most once; the claim is taken in the database before any notification is
//! attempted, so a crash mid-dispatch can drop a notification but never
//! duplicate one.

use chrono::Utc;
use proplet_common::{AppError, AppResult, IdGenerator};
use proplet_db::entities::{property, property_alert, user};
use proplet_db::repositories::AlertRepository;
use sea_orm::Set;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::ValidateEmail;

use super::email::EmailSender;
use super::whatsapp::WhatsAppSender;

/// Input for registering an alert.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAlertInput {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub property_type: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Minimum bedroom count.
    pub bedrooms: Option<i32>,
    /// Minimum bathroom count.
    pub bathrooms: Option<i32>,
}

/// What a dispatch run did for one approved listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Alerts whose criteria the listing satisfied.
    pub matched: usize,
    /// Alerts this run claimed and attempted to notify.
    pub notified: usize,
}

/// Whether `property` satisfies every criterion of `alert`.
///
/// Unset criteria are wildcards. Text comparisons ignore case; bedroom and
/// bathroom bounds are minimums, so a listing with more rooms than asked for
/// still matches.
#[must_use]
pub fn alert_matches(alert: &property_alert::Model, property: &property::Model) -> bool {
    if !alert.property_type.eq_ignore_ascii_case(&property.property_type) {
        return false;
    }

    if let Some(state) = &alert.state {
        if !state.eq_ignore_ascii_case(&property.state) {
            return false;
        }
    }

    if let Some(city) = &alert.city {
        if !city.eq_ignore_ascii_case(&property.city) {
            return false;
        }
    }

    if let Some(min) = alert.min_price {
        if property.rent_amount < min {
            return false;
        }
    }

    if let Some(max) = alert.max_price {
        if property.rent_amount > max {
            return false;
        }
    }

    if let Some(bedrooms) = alert.bedrooms {
        if property.bedrooms < bedrooms {
            return false;
        }
    }

    if let Some(bathrooms) = alert.bathrooms {
        if property.bathrooms < bathrooms {
            return false;
        }
    }

    true
}

/// Service for property alerts.
#[derive(Clone)]
pub struct AlertService {
    alert_repo: AlertRepository,
    email: Arc<dyn EmailSender>,
    whatsapp: Arc<dyn WhatsAppSender>,
    id_gen: IdGenerator,
}

impl AlertService {
    /// Create a new alert service.
    #[must_use]
    pub fn new(
        alert_repo: AlertRepository,
        email: Arc<dyn EmailSender>,
        whatsapp: Arc<dyn WhatsAppSender>,
    ) -> Self {
        Self {
            alert_repo,
            email,
            whatsapp,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new alert.
    ///
    /// Available to authenticated users and anonymous visitors alike; the
    /// optional `user` only links the alert to an account.
    pub async fn register(
        &self,
        user: Option<&user::Model>,
        input: RegisterAlertInput,
    ) -> AppResult<property_alert::Model> {
        Self::validate(&input)?;

        let model = property_alert::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.map(|u| u.id.clone())),
            full_name: Set(input.full_name.trim().to_string()),
            email: Set(input.email.trim().to_lowercase()),
            phone: Set(input.phone),
            property_type: Set(input.property_type.trim().to_lowercase()),
            state: Set(input.state),
            city: Set(input.city),
            min_price: Set(input.min_price),
            max_price: Set(input.max_price),
            bedrooms: Set(input.bedrooms),
            bathrooms: Set(input.bathrooms),
            active: Set(true),
            notified_at: Set(None),
            matched_property_id: Set(None),
            created_at: Set(Utc::now().into()),
        };

        self.alert_repo.create(model).await
    }

    fn validate(input: &RegisterAlertInput) -> AppResult<()> {
        if input.full_name.trim().is_empty() {
            return Err(AppError::Validation("A name is required".to_string()));
        }

        if !input.email.validate_email() {
            return Err(AppError::Validation(format!(
                "Invalid email address: {}",
                input.email
            )));
        }

        if input.property_type.trim().is_empty() {
            return Err(AppError::Validation(
                "A property type is required".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (input.min_price, input.max_price) {
            if min > max {
                return Err(AppError::Validation(
                    "Minimum price exceeds maximum price".to_string(),
                ));
            }
        }

        for bound in [input.min_price, input.max_price] {
            if bound.is_some_and(|v| v < 0) {
                return Err(AppError::Validation(
                    "Prices cannot be negative".to_string(),
                ));
            }
        }

        for count in [input.bedrooms, input.bathrooms] {
            if count.is_some_and(|v| v < 0) {
                return Err(AppError::Validation(
                    "Room counts cannot be negative".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Run alert dispatch for a newly approved listing.
    ///
    /// For every open alert the listing satisfies, claim it and notify the
    /// requester. The claim happens first: once `notified_at` is set the
    /// alert can never fire again, so a lost notification is the worst case,
    /// never a duplicate. Notification failures are logged and do not fail
    /// the run.
    pub async fn dispatch_for_property(
        &self,
        property: &property::Model,
    ) -> AppResult<DispatchSummary> {
        let candidates = self
            .alert_repo
            .find_open_by_type(&property.property_type)
            .await?;

        let mut summary = DispatchSummary::default();

        for alert in candidates {
            if !alert_matches(&alert, property) {
                continue;
            }
            summary.matched += 1;

            let rows = self.alert_repo.claim(&alert.id, &property.id).await?;
            if rows == 0 {
                // A concurrent approval claimed this alert first.
                continue;
            }
            summary.notified += 1;

            self.notify(&alert, property).await;
        }

        info!(
            property_id = %property.id,
            matched = summary.matched,
            notified = summary.notified,
            "Dispatched property alerts"
        );

        Ok(summary)
    }

    async fn notify(&self, alert: &property_alert::Model, property: &property::Model) {
        let subject = format!("A property matching your alert: {}", property.title);
        let body = format!(
            "Hello {},\n\nA listing matching your alert was just published:\n\n\
             {}\n{} bedroom(s), {} bathroom(s)\n{}, {}\n\u{20a6}{} / year\n\n\
             Log in to view the listing.",
            alert.full_name,
            property.title,
            property.bedrooms,
            property.bathrooms,
            property.city,
            property.state,
            property.rent_amount,
        );

        if let Err(e) = self.email.send(&alert.email, &subject, &body).await {
            warn!(alert_id = %alert.id, error = %e, "Alert email failed");
        }

        if let Some(phone) = &alert.phone {
            if let Err(e) = self.whatsapp.send_text(phone, &body).await {
                warn!(alert_id = %alert.id, error = %e, "Alert WhatsApp message failed");
            }
        }
    }

    /// List alerts registered with an email address, newest first.
    pub async fn list_for_email(
        &self,
        email: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<property_alert::Model>> {
        self.alert_repo
            .list_for_email(&email.trim().to_lowercase(), limit, offset)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proplet_db::test_utils::{mock_alert, mock_property};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    struct RecordingEmail;

    #[async_trait::async_trait]
    impl EmailSender for RecordingEmail {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> AppResult<()> {
            Ok(())
        }
    }

    struct RecordingWhatsApp;

    #[async_trait::async_trait]
    impl WhatsAppSender for RecordingWhatsApp {
        async fn send_text(&self, _phone: &str, _body: &str) -> AppResult<()> {
            Ok(())
        }
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> AlertService {
        AlertService::new(
            AlertRepository::new(db),
            Arc::new(RecordingEmail),
            Arc::new(RecordingWhatsApp),
        )
    }

    #[test]
    fn test_match_unset_criteria_are_wildcards() {
        let mut alert = mock_alert("alert1");
        alert.state = None;
        alert.max_price = None;
        alert.bedrooms = None;

        let property = mock_property("prop1", "landlord1");
        assert!(alert_matches(&alert, &property));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let mut alert = mock_alert("alert1");
        alert.property_type = "Apartment".to_string();
        alert.state = Some("LAGOS".to_string());
        alert.city = Some("lekki".to_string());

        let property = mock_property("prop1", "landlord1");
        assert!(alert_matches(&alert, &property));
    }

    #[test]
    fn test_match_price_bounds() {
        let mut alert = mock_alert("alert1");
        let property = mock_property("prop1", "landlord1");

        alert.max_price = Some(700_000);
        assert!(!alert_matches(&alert, &property));

        alert.max_price = Some(750_000);
        assert!(alert_matches(&alert, &property));

        alert.min_price = Some(800_000);
        assert!(!alert_matches(&alert, &property));
    }

    #[test]
    fn test_match_room_counts_are_minimums() {
        let mut alert = mock_alert("alert1");
        let property = mock_property("prop1", "landlord1");

        // Asking for 1 bedroom; a 2-bedroom listing still matches.
        alert.bedrooms = Some(1);
        assert!(alert_matches(&alert, &property));

        alert.bedrooms = Some(3);
        assert!(!alert_matches(&alert, &property));
    }

    #[test]
    fn test_register_validation() {
        let input = RegisterAlertInput {
            full_name: "Chika Eze".to_string(),
            email: "not-an-email".to_string(),
            phone: None,
            property_type: "apartment".to_string(),
            state: None,
            city: None,
            min_price: None,
            max_price: None,
            bedrooms: None,
            bathrooms: None,
        };
        assert!(matches!(
            AlertService::validate(&input),
            Err(AppError::Validation(_))
        ));

        let inverted = RegisterAlertInput {
            email: "chika@example.com".to_string(),
            min_price: Some(900_000),
            max_price: Some(800_000),
            ..input
        };
        assert!(matches!(
            AlertService::validate(&inverted),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_claims_before_notifying() {
        let matching = mock_alert("alert1");
        let mut off_budget = mock_alert("alert2");
        off_budget.max_price = Some(100_000);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[matching, off_budget]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let svc = service(db);
        let property = mock_property("prop1", "landlord1");

        let summary = svc.dispatch_for_property(&property).await.unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.notified, 1);
    }

    #[tokio::test]
    async fn test_dispatch_skips_lost_claims() {
        let alert = mock_alert("alert1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alert]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let svc = service(db);
        let property = mock_property("prop1", "landlord1");

        // The claim lost a race with a concurrent approval; matched but not
        // notified.
        let summary = svc.dispatch_for_property(&property).await.unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.notified, 0);
    }
}
