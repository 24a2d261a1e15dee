//! Tenant property alert entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A standing "notify me" request with match criteria.
///
/// Every bound except `property_type` is optional; an unset bound is a
/// wildcard. Once `notified_at` is set the alert is terminal for matching
/// purposes and is never matched or notified again.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property_alert")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Requesting user; null for anonymous submissions.
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    pub full_name: String,

    pub email: String,

    #[sea_orm(nullable)]
    pub phone: Option<String>,

    // === Criteria ===
    pub property_type: String,

    #[sea_orm(nullable)]
    pub state: Option<String>,

    #[sea_orm(nullable)]
    pub city: Option<String>,

    #[sea_orm(nullable)]
    pub min_price: Option<i64>,

    #[sea_orm(nullable)]
    pub max_price: Option<i64>,

    /// Minimum bedroom count the tenant wants.
    #[sea_orm(nullable)]
    pub bedrooms: Option<i32>,

    /// Minimum bathroom count the tenant wants.
    #[sea_orm(nullable)]
    pub bathrooms: Option<i32>,

    #[sea_orm(default_value = true)]
    pub active: bool,

    /// Set exactly once by the alert matcher.
    #[sea_orm(nullable)]
    pub notified_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub matched_property_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
