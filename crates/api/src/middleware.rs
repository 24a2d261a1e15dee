//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use proplet_core::{
    AccessGate, AlertService, AuditService, ContactVerificationService, ListingService,
    UnlockService, VerificationService,
};
use proplet_db::repositories::{PropertyRepository, UserRepository};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_repo: UserRepository,
    pub property_repo: PropertyRepository,
    pub verification_service: VerificationService,
    pub contact_service: ContactVerificationService,
    pub access_gate: AccessGate,
    pub unlock_service: UnlockService,
    pub alert_service: AlertService,
    pub listing_service: ListingService,
    pub audit_service: AuditService,
}

/// Authentication middleware.
///
/// Resolves a bearer token to a user and stashes the model in request
/// extensions. Never rejects on its own: endpoints that require a user do so
/// through the [`crate::extractors::AuthUser`] extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(Some(user)) = state.user_repo.find_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
