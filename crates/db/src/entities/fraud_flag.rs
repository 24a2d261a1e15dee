//! Fraud flag entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A rule hit raised against an entity for super-admin review.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fraud_flag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Kind of record flagged, e.g. "user", "property".
    pub entity_type: String,

    #[sea_orm(indexed)]
    pub entity_id: String,

    /// Name of the rule that fired.
    pub rule: String,

    /// Rule-assigned severity score.
    pub score: i32,

    #[sea_orm(default_value = false)]
    pub resolved: bool,

    #[sea_orm(nullable)]
    pub resolved_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
