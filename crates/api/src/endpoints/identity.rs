//! Identity and contact verification endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use proplet_common::{AppResult, CodeKind};
use proplet_core::{SubmitDocumentsInput, VerificationService, VerificationState};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Identity status response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityStatusResponse {
    pub state: String,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub identity_verified: bool,
    pub submitted_at: Option<String>,
}

const fn state_label(state: VerificationState) -> &'static str {
    match state {
        VerificationState::Unsubmitted => "unsubmitted",
        VerificationState::PendingReview => "pending_review",
        VerificationState::Verified => "verified",
    }
}

/// Confirm code request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCodeRequest {
    pub code: String,
}

// ==================== Handlers ====================

/// Submit identity documents.
async fn submit_documents(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitDocumentsInput>,
) -> AppResult<ApiResponse<IdentityStatusResponse>> {
    let updated = state
        .verification_service
        .submit_documents(&user.id, input)
        .await?;

    Ok(ApiResponse::ok(status_of(&updated)))
}

/// Current verification status.
async fn status(AuthUser(user): AuthUser) -> AppResult<ApiResponse<IdentityStatusResponse>> {
    Ok(ApiResponse::ok(status_of(&user)))
}

fn status_of(user: &proplet_db::entities::user::Model) -> IdentityStatusResponse {
    IdentityStatusResponse {
        state: state_label(VerificationService::state_of(user)).to_string(),
        email_verified: user.email_verified,
        phone_verified: user.phone_verified,
        identity_verified: user.identity_verified,
        submitted_at: user.identity_submitted_at.map(|dt| dt.to_rfc3339()),
    }
}

/// Send an email verification code.
async fn request_email_code(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state
        .contact_service
        .request_code(&user, CodeKind::Email)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Confirm an email verification code.
async fn confirm_email_code(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ConfirmCodeRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .contact_service
        .confirm_code(&user, CodeKind::Email, &req.code)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Send a phone verification code over WhatsApp.
async fn request_phone_code(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state
        .contact_service
        .request_code(&user, CodeKind::Phone)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Confirm a phone verification code.
async fn confirm_phone_code(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ConfirmCodeRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .contact_service
        .confirm_code(&user, CodeKind::Phone, &req.code)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Create the identity router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/documents", post(submit_documents))
        .route("/status", get(status))
        .route("/email/request", post(request_email_code))
        .route("/email/confirm", post(confirm_email_code))
        .route("/phone/request", post(request_phone_code))
        .route("/phone/confirm", post(confirm_phone_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_labels() {
        assert_eq!(state_label(VerificationState::Unsubmitted), "unsubmitted");
        assert_eq!(
            state_label(VerificationState::PendingReview),
            "pending_review"
        );
        assert_eq!(state_label(VerificationState::Verified), "verified");
    }
}
