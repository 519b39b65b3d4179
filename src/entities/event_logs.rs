use sea_orm::entity::prelude::*;

/// Append-only audit trail. No update path exists for these rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub event_type: String,

    pub description: String,

    /// Acting user, if the event is attributable to one.
    pub user_id: Option<i32>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
