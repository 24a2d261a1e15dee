//! Property listing endpoints.
//!
//! The detail endpoint is where the paid-access gate bites: protected fields
//! and landlord contact details are serialized only when the gate grants the
//! full view. The public view omits them entirely rather than nulling them,
//! so clients cannot distinguish "no video" from "pay to see the video".

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use proplet_common::{AppError, AppResult};
use proplet_core::{AccessDecision, InitializeOutcome, SubmitListingInput};
use proplet_db::entities::{property, user};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

/// Listing response. Protected fields are present only in the full view.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub id: String,
    pub title: String,
    pub property_type: String,
    pub state: String,
    pub city: String,
    pub rent_amount: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub rating: Option<i32>,
    pub status: property::PropertyStatus,
    pub created_at: String,

    /// Whether this response carries the protected fields.
    pub unlocked: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landlord: Option<LandlordContact>,
}

/// Landlord contact details, served in the full view only.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandlordContact {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl PropertyResponse {
    fn public(p: property::Model) -> Self {
        Self {
            id: p.id,
            title: p.title,
            property_type: p.property_type,
            state: p.state,
            city: p.city,
            rent_amount: p.rent_amount,
            bedrooms: p.bedrooms,
            bathrooms: p.bathrooms,
            rating: p.rating,
            status: p.status,
            created_at: p.created_at.to_rfc3339(),
            unlocked: false,
            full_address: None,
            amenities: None,
            video_url: None,
            landlord: None,
        }
    }

    fn full(p: property::Model, landlord: Option<user::Model>) -> Self {
        let full_address = Some(p.full_address.clone());
        let amenities = Some(p.amenities.clone());
        let video_url = p.video_url.clone();

        let mut response = Self::public(p);
        response.unlocked = true;
        response.full_address = full_address;
        response.amenities = amenities;
        response.video_url = video_url;
        response.landlord = landlord.map(|l| LandlordContact {
            full_name: l.full_name,
            email: l.email,
            phone: l.phone,
        });
        response
    }
}

/// Unlock initialization response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockInitResponse {
    pub already_unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Listing pagination request.
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

/// Submit a listing into the moderation queue.
async fn submit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitListingInput>,
) -> AppResult<ApiResponse<PropertyResponse>> {
    let property = state.listing_service.submit(&user, input).await?;

    // The submitter sees their own listing in full.
    Ok(ApiResponse::ok(PropertyResponse::full(property, None)))
}

/// The authenticated landlord's own listings.
async fn list_own(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<ListRequest>,
) -> AppResult<ApiResponse<Vec<PropertyResponse>>> {
    let listings = state
        .listing_service
        .list_own(&user, req.limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(
        listings
            .into_iter()
            .map(|p| PropertyResponse::full(p, None))
            .collect(),
    ))
}

/// Listing detail, gated by viewer entitlements.
async fn detail(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> AppResult<ApiResponse<PropertyResponse>> {
    let (property, landlord) = state
        .property_repo
        .find_with_landlord(&property_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property not found: {property_id}")))?;

    // Unapproved listings exist only for their owner and staff.
    if property.status != property::PropertyStatus::Approved {
        let visible = viewer.as_ref().is_some_and(|v| {
            v.id == property.landlord_id
                || matches!(
                    v.user_type,
                    user::UserRole::Admin | user::UserRole::SuperAdmin
                )
        });
        if !visible {
            return Err(AppError::NotFound(format!(
                "Property not found: {property_id}"
            )));
        }
    }

    let decision = state.access_gate.evaluate(viewer.as_ref(), &property).await?;

    let response = match decision {
        AccessDecision::FullView => PropertyResponse::full(property, landlord),
        AccessDecision::PublicView => PropertyResponse::public(property),
    };

    Ok(ApiResponse::ok(response))
}

/// Start a pay-to-unlock charge for one listing.
async fn unlock(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> AppResult<ApiResponse<UnlockInitResponse>> {
    let outcome = state.unlock_service.initialize(&user, &property_id).await?;

    let response = match outcome {
        InitializeOutcome::AlreadyUnlocked => UnlockInitResponse {
            already_unlocked: true,
            authorization_url: None,
            reference: None,
        },
        InitializeOutcome::Checkout {
            authorization_url,
            reference,
        } => UnlockInitResponse {
            already_unlocked: false,
            authorization_url: Some(authorization_url),
            reference: Some(reference),
        },
    };

    Ok(ApiResponse::ok(response))
}

/// Create the properties router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit))
        .route("/mine", get(list_own))
        .route("/{id}", get(detail))
        .route("/{id}/unlock", post(unlock))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proplet_db::test_utils::mock_property;

    #[test]
    fn test_public_view_omits_protected_fields() {
        let response = PropertyResponse::public(mock_property("prop1", "landlord1"));
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"unlocked\":false"));
        // Omitted, not nulled: the public view gives no hint of what exists.
        assert!(!json.contains("fullAddress"));
        assert!(!json.contains("videoUrl"));
        assert!(!json.contains("landlord"));
    }

    #[test]
    fn test_full_view_carries_protected_fields() {
        let mut landlord = proplet_db::test_utils::mock_tenant("landlord1");
        landlord.user_type = user::UserRole::Landlord;

        let response =
            PropertyResponse::full(mock_property("prop1", "landlord1"), Some(landlord));
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"unlocked\":true"));
        assert!(json.contains("\"fullAddress\":\"12 Admiralty Way, Lekki Phase 1\""));
        assert!(json.contains("\"landlord\""));
    }
}
