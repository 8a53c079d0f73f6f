use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

/// Compte utilisateur (signup/login + reset password).
/// L'email est UNIQUE en base : c'est la contrainte qui fait foi pour
/// détecter les doublons au signup, pas un find préalable.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)] // Jamais exposé en JSON
    pub password_hash: Option<String>, // Format: pbkdf2:sha256:iterations$salt$hash
    pub created_at: DateTimeUtc,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>, // UUID v4, usage unique
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTimeUtc>, // created + 1 heure
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
