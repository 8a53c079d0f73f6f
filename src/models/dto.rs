use serde::Serialize;
use chrono::{DateTime, Utc};

use crate::models::{pricing, users};

/// Résumé de compte renvoyé aux clients.
/// Ne contient jamais le password_hash ni les tokens de reset.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: i32,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<&users::Model> for AccountSummary {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<&pricing::Model> for AccountSummary {
    fn from(entry: &pricing::Model) -> Self {
        Self {
            id: entry.id,
            email: entry.email.clone(),
            created_at: entry.created_at,
        }
    }
}
