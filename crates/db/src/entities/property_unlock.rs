//! Per-property unlock grant entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// State of a pay-to-unlock attempt.
///
/// A record is created `pending` when a charge is initialized and promoted to
/// `unlocked` only after the provider confirms completion. Records are never
/// deleted; failed attempts stay `pending` as an audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
#[serde(rename_all = "snake_case")]
pub enum UnlockStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "unlocked")]
    Unlocked,
}

/// A tenant's entitlement to one property's protected fields.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property_unlock")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(indexed)]
    pub property_id: String,

    /// Opaque payment reference shared with the provider.
    #[sea_orm(unique)]
    pub reference: String,

    /// Charge amount in the currency's minor unit.
    pub amount: i64,

    pub status: UnlockStatus,

    pub created_at: DateTimeWithTimeZone,

    /// Set exactly once, when the provider confirms the charge.
    #[sea_orm(nullable)]
    pub unlocked_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
