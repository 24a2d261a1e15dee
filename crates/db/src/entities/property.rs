//! Property listing entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Property listing.
///
/// Public fields (type, city/state, rent, bed/bath counts, rating) are served
/// to everyone; the protected fields (full address, amenities, video, and the
/// landlord's contact details via the relation) require an entitlement from
/// the access gate.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub landlord_id: String,

    pub title: String,

    /// Free-form type tag, e.g. "apartment", "duplex".
    pub property_type: String,

    pub state: String,

    pub city: String,

    /// Monthly rent in the currency's minor unit.
    pub rent_amount: i64,

    pub bedrooms: i32,

    pub bathrooms: i32,

    /// Aggregate star rating, if any reviews exist.
    #[sea_orm(nullable)]
    pub rating: Option<i32>,

    // === Protected fields ===
    pub full_address: String,

    /// JSON array of amenity names.
    #[sea_orm(column_type = "JsonBinary")]
    pub amenities: Json,

    #[sea_orm(nullable)]
    pub video_url: Option<String>,

    // === Moderation ===
    pub status: PropertyStatus,

    #[sea_orm(nullable)]
    pub moderated_by: Option<String>,

    #[sea_orm(nullable)]
    pub moderated_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LandlordId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Landlord,
    #[sea_orm(has_many = "super::property_unlock::Entity")]
    Unlocks,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Landlord.def()
    }
}

impl Related<super::property_unlock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unlocks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
