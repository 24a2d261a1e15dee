//! Property alert endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use proplet_common::AppResult;
use proplet_core::RegisterAlertInput;
use proplet_db::entities::property_alert;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

/// Alert response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub id: String,
    pub property_type: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub active: bool,
    pub notified_at: Option<String>,
    pub matched_property_id: Option<String>,
    pub created_at: String,
}

impl From<property_alert::Model> for AlertResponse {
    fn from(a: property_alert::Model) -> Self {
        Self {
            id: a.id,
            property_type: a.property_type,
            state: a.state,
            city: a.city,
            min_price: a.min_price,
            max_price: a.max_price,
            bedrooms: a.bedrooms,
            bathrooms: a.bathrooms,
            active: a.active,
            notified_at: a.notified_at.map(|dt| dt.to_rfc3339()),
            matched_property_id: a.matched_property_id,
            created_at: a.created_at.to_rfc3339(),
        }
    }
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

/// Register a new alert. Open to anonymous visitors.
async fn register(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Json(input): Json<RegisterAlertInput>,
) -> AppResult<ApiResponse<AlertResponse>> {
    let alert = state.alert_service.register(user.as_ref(), input).await?;

    Ok(ApiResponse::ok(alert.into()))
}

/// The authenticated user's alerts, matched by account email.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<ListRequest>,
) -> AppResult<ApiResponse<Vec<AlertResponse>>> {
    let alerts = state
        .alert_service
        .list_for_email(&user.email, req.limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(
        alerts.into_iter().map(AlertResponse::from).collect(),
    ))
}

/// Create the alerts router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(register).get(list))
}
