//! Test fixtures shared by repository and service tests.
//!
//! These build fully-populated models so individual tests only override the
//! fields they care about.

#![allow(missing_docs)]

use chrono::Utc;
use serde_json::json;

use crate::entities::{
    property::{self, PropertyStatus},
    property_alert,
    property_unlock::{self, UnlockStatus},
    user::{self, DocumentType, UserRole},
};

/// A tenant with a complete, reviewable identity submission.
#[must_use]
pub fn mock_tenant(id: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        full_name: "Ada Obi".to_string(),
        phone: Some("+2348012345678".to_string()),
        user_type: UserRole::Tenant,
        token: Some(format!("token-{id}")),
        document_type: Some(DocumentType::NationalId),
        document_number: Some("12345678901".to_string()),
        nationality: None,
        identity_photo_url: Some("https://cdn.example.com/ids/ada.jpg".to_string()),
        identity_submitted_at: Some(Utc::now().into()),
        email_verified: true,
        phone_verified: true,
        identity_verified: false,
        identity_verified_by: None,
        identity_verified_at: None,
        subscription_active: false,
        subscription_expires_at: None,
        deleted_at: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

#[must_use]
pub fn mock_admin(id: &str, role: UserRole) -> user::Model {
    user::Model {
        user_type: role,
        document_type: None,
        document_number: None,
        identity_photo_url: None,
        identity_submitted_at: None,
        ..mock_tenant(id)
    }
}

/// An approved apartment listing in Lagos.
#[must_use]
pub fn mock_property(id: &str, landlord_id: &str) -> property::Model {
    property::Model {
        id: id.to_string(),
        landlord_id: landlord_id.to_string(),
        title: "2-bed apartment, Lekki Phase 1".to_string(),
        property_type: "apartment".to_string(),
        state: "Lagos".to_string(),
        city: "Lekki".to_string(),
        rent_amount: 750_000,
        bedrooms: 2,
        bathrooms: 2,
        rating: Some(4),
        full_address: "12 Admiralty Way, Lekki Phase 1".to_string(),
        amenities: json!(["parking", "borehole"]),
        video_url: Some("https://cdn.example.com/tours/p1.mp4".to_string()),
        status: PropertyStatus::Approved,
        moderated_by: None,
        moderated_at: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// An open alert for apartments in Lagos.
#[must_use]
pub fn mock_alert(id: &str) -> property_alert::Model {
    property_alert::Model {
        id: id.to_string(),
        user_id: None,
        full_name: "Chika Eze".to_string(),
        email: "chika@example.com".to_string(),
        phone: Some("+2348098765432".to_string()),
        property_type: "apartment".to_string(),
        state: Some("Lagos".to_string()),
        city: None,
        min_price: None,
        max_price: Some(800_000),
        bedrooms: Some(2),
        bathrooms: None,
        active: true,
        notified_at: None,
        matched_property_id: None,
        created_at: Utc::now().into(),
    }
}

#[must_use]
pub fn mock_unlock(id: &str, user_id: &str, property_id: &str) -> property_unlock::Model {
    property_unlock::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        property_id: property_id.to_string(),
        reference: format!("plt_{id}"),
        amount: 5_000,
        status: UnlockStatus::Pending,
        created_at: Utc::now().into(),
        unlocked_at: None,
    }
}
