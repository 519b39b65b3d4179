use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// "Admin" or "User"
    pub role: String,

    /// Opaque refresh token. One slot per user; overwriting it
    /// invalidates the previous token.
    pub refresh_token: Option<String>,

    /// RFC 3339 expiry of the refresh token, set together with it.
    pub refresh_token_expires_at: Option<String>,

    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
