//! Audit log entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of a moderation or verification action.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Acting admin or super-admin.
    #[sea_orm(indexed)]
    pub actor_id: String,

    /// Action name, e.g. "identity.approve".
    pub action: String,

    /// Kind of record acted on, e.g. "user", "property".
    pub target_type: String,

    pub target_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
