//! Unlock verification endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use proplet_common::AppResult;
use proplet_core::VerifyOutcome;
use proplet_db::entities::property_unlock;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Unlock record response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    pub id: String,
    pub property_id: String,
    pub reference: String,
    pub amount: i64,
    pub status: property_unlock::UnlockStatus,
    pub created_at: String,
    pub unlocked_at: Option<String>,
}

impl From<property_unlock::Model> for UnlockResponse {
    fn from(u: property_unlock::Model) -> Self {
        Self {
            id: u.id,
            property_id: u.property_id,
            reference: u.reference,
            amount: u.amount,
            status: u.status,
            created_at: u.created_at.to_rfc3339(),
            unlocked_at: u.unlocked_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Verify request: the provider appends the reference to the return URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub reference: String,
}

/// Verify response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub status: &'static str,
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

const fn default_limit() -> u64 {
    20
}

// ==================== Handlers ====================

/// Verify a charge after the checkout redirect. Safe to replay.
async fn verify(
    State(state): State<AppState>,
    Query(req): Query<VerifyRequest>,
) -> AppResult<ApiResponse<VerifyResponse>> {
    let outcome = state.unlock_service.verify(&req.reference).await?;

    let status = match outcome {
        VerifyOutcome::Unlocked => "unlocked",
        VerifyOutcome::Pending => "pending",
    };

    Ok(ApiResponse::ok(VerifyResponse { status }))
}

/// The authenticated tenant's unlock history.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<ListRequest>,
) -> AppResult<ApiResponse<Vec<UnlockResponse>>> {
    let unlocks = state
        .unlock_service
        .list_for_user(&user, req.limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(
        unlocks.into_iter().map(UnlockResponse::from).collect(),
    ))
}

/// Create the unlocks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/verify", get(verify))
}
