//! API endpoints.

mod admin;
mod alerts;
mod identity;
mod properties;
mod unlocks;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/identity", identity::router())
        .nest("/properties", properties::router())
        .nest("/unlocks", unlocks::router())
        .nest("/alerts", alerts::router())
        .nest("/admin", admin::router())
}
