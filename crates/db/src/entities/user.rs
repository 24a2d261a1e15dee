//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed set of account roles.
///
/// Role checks go through `proplet_core`'s policy module rather than ad-hoc
/// string comparisons in handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "tenant")]
    Tenant,
    #[sea_orm(string_value = "landlord")]
    Landlord,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
}

/// Accepted identity document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// National Identification Number, exactly 11 digits.
    #[sea_orm(string_value = "national_id")]
    NationalId,
    /// Passport number, 6-20 alphanumeric characters.
    #[sea_orm(string_value = "passport")]
    Passport,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    pub full_name: String,

    #[sea_orm(nullable)]
    pub phone: Option<String>,

    pub user_type: UserRole,

    /// API bearer token issued by the auth collaborator.
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    // === Identity document fields ===
    #[sea_orm(nullable)]
    pub document_type: Option<DocumentType>,

    #[sea_orm(nullable)]
    pub document_number: Option<String>,

    /// Required for passport submissions.
    #[sea_orm(nullable)]
    pub nationality: Option<String>,

    /// Photo of the identity document. Shared by both document types;
    /// cleared on rejection to force a fresh submission.
    #[sea_orm(nullable)]
    pub identity_photo_url: Option<String>,

    /// When the current document set was submitted. Drives FIFO review order.
    #[sea_orm(nullable)]
    pub identity_submitted_at: Option<DateTimeWithTimeZone>,

    // === Verification state ===
    #[sea_orm(default_value = false)]
    pub email_verified: bool,

    #[sea_orm(default_value = false)]
    pub phone_verified: bool,

    /// Only true when a photo, a document number, and both contact
    /// verifications are present. Enforced at the mutation layer.
    #[sea_orm(default_value = false)]
    pub identity_verified: bool,

    /// Admin who approved the identity.
    #[sea_orm(nullable)]
    pub identity_verified_by: Option<String>,

    #[sea_orm(nullable)]
    pub identity_verified_at: Option<DateTimeWithTimeZone>,

    // === Subscription entitlement ===
    #[sea_orm(default_value = false)]
    pub subscription_active: bool,

    #[sea_orm(nullable)]
    pub subscription_expires_at: Option<DateTimeWithTimeZone>,

    /// Soft delete marker.
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::property::Entity")]
    Properties,

    #[sea_orm(has_many = "super::property_unlock::Entity")]
    Unlocks,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Properties.def()
    }
}

impl Related<super::property_unlock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unlocks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
