//! Admin and super-admin endpoints.
//!
//! Role checks live in the core services, not here; these handlers pass the
//! acting user through and translate results.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use proplet_common::AppResult;
use proplet_db::entities::{audit_log, fraud_flag, user};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Identity review queue entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingIdentityResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub user_type: user::UserRole,
    pub document_type: Option<user::DocumentType>,
    pub document_number: Option<String>,
    pub nationality: Option<String>,
    pub identity_photo_url: Option<String>,
    pub submitted_at: Option<String>,
}

impl From<user::Model> for PendingIdentityResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            email: u.email,
            user_type: u.user_type,
            document_type: u.document_type,
            document_number: u.document_number,
            nationality: u.nationality,
            identity_photo_url: u.identity_photo_url,
            submitted_at: u.identity_submitted_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Identity review queue page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingIdentitiesResponse {
    pub total: u64,
    pub identities: Vec<PendingIdentityResponse>,
}

/// Review queue request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueRequest {
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Pagination request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Listing moderation result.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResponse {
    pub alerts_matched: usize,
    pub alerts_notified: usize,
}

/// Audit entry response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryResponse {
    pub id: String,
    pub actor_id: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub created_at: String,
}

impl From<audit_log::Model> for AuditEntryResponse {
    fn from(e: audit_log::Model) -> Self {
        Self {
            id: e.id,
            actor_id: e.actor_id,
            action: e.action,
            target_type: e.target_type,
            target_id: e.target_id,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

/// Fraud flag response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudFlagResponse {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub rule: String,
    pub score: i32,
    pub resolved: bool,
    pub created_at: String,
}

impl From<fraud_flag::Model> for FraudFlagResponse {
    fn from(f: fraud_flag::Model) -> Self {
        Self {
            id: f.id,
            entity_type: f.entity_type,
            entity_id: f.entity_id,
            rule: f.rule,
            score: f.score,
            resolved: f.resolved,
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

const fn default_limit() -> u64 {
    20
}

// ==================== Handlers ====================

/// Identity review queue, earliest submissions first.
async fn pending_identities(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<ReviewQueueRequest>,
) -> AppResult<ApiResponse<PendingIdentitiesResponse>> {
    let search = req.search.as_deref();

    let total = state
        .verification_service
        .count_pending(&user, search)
        .await?;
    let identities = state
        .verification_service
        .list_pending(&user, search, req.limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(PendingIdentitiesResponse {
        total,
        identities: identities
            .into_iter()
            .map(PendingIdentityResponse::from)
            .collect(),
    }))
}

/// Approve an identity.
async fn approve_identity(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.verification_service.approve(&user, &user_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Reject an identity.
async fn reject_identity(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.verification_service.reject(&user, &user_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Listing moderation queue, oldest first.
async fn pending_listings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<ListRequest>,
) -> AppResult<ApiResponse<Vec<proplet_db::entities::property::Model>>> {
    let listings = state
        .listing_service
        .list_pending(&user, req.limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(listings))
}

/// Approve a listing and dispatch matching alerts.
async fn approve_listing(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> AppResult<ApiResponse<ModerationResponse>> {
    let (_, summary) = state.listing_service.approve(&user, &property_id).await?;

    Ok(ApiResponse::ok(ModerationResponse {
        alerts_matched: summary.matched,
        alerts_notified: summary.notified,
    }))
}

/// Reject a listing.
async fn reject_listing(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.listing_service.reject(&user, &property_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Audit trail, newest first. Super-admin only.
async fn audit_entries(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<ListRequest>,
) -> AppResult<ApiResponse<Vec<AuditEntryResponse>>> {
    let entries = state
        .audit_service
        .list_entries(&user, req.limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(
        entries.into_iter().map(AuditEntryResponse::from).collect(),
    ))
}

/// Unresolved fraud flags, newest first. Super-admin only.
async fn open_flags(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<ListRequest>,
) -> AppResult<ApiResponse<Vec<FraudFlagResponse>>> {
    let flags = state
        .audit_service
        .list_open_flags(&user, req.limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(
        flags.into_iter().map(FraudFlagResponse::from).collect(),
    ))
}

/// Resolve a fraud flag. Super-admin only.
async fn resolve_flag(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(flag_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.audit_service.resolve_flag(&user, &flag_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/identities", get(pending_identities))
        .route("/identities/{id}/approve", post(approve_identity))
        .route("/identities/{id}/reject", post(reject_identity))
        .route("/listings", get(pending_listings))
        .route("/listings/{id}/approve", post(approve_listing))
        .route("/listings/{id}/reject", post(reject_listing))
        .route("/audit", get(audit_entries))
        .route("/flags", get(open_flags))
        .route("/flags/{id}/resolve", post(resolve_flag))
}
