use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::models::users::{self, Column as UserColumn, Entity as Users};
use crate::services::store::{StoreError, with_timeout};
use crate::utils::password;

/// Durée de validité d'un token de reset (1 heure)
const RESET_TOKEN_TTL_HOURS: i64 = 1;

pub struct UserService;

impl UserService {
    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<users::Model, StoreError> {
        let user = with_timeout(
            Users::find()
                .filter(UserColumn::Email.eq(email))
                .one(db),
        )
        .await?;

        user.ok_or(StoreError::NotFound)
    }

    /// Crée un compte. Pas de find préalable : l'insert part directement
    /// et la contrainte UNIQUE sur email fait foi, une violation devient
    /// StoreError::Conflict (évite la course check-then-create entre deux
    /// signups concurrents).
    pub async fn create(
        db: &DatabaseConnection,
        email: &str,
        password_hash: Option<String>,
    ) -> Result<users::Model, StoreError> {
        let new_user = users::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
            reset_token: Set(None),
            reset_token_expiry: Set(None),
            ..Default::default()
        };

        with_timeout(new_user.insert(db)).await
    }

    /// Vérifie un mot de passe en clair contre le hash du compte.
    /// Retourne false (jamais d'erreur) sur mismatch, hash absent ou
    /// hash illisible.
    pub fn verify_credentials(user: &users::Model, plaintext: &str) -> bool {
        match user.password_hash {
            Some(ref hash) => password::verify_password(plaintext, hash).unwrap_or(false),
            None => false,
        }
    }

    /// Génère un token de reset (UUID v4, expire dans 1h) et l'attache
    /// au compte. Retourne le token et son expiration.
    pub async fn set_reset_token(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<(String, chrono::DateTime<Utc>), StoreError> {
        let user = Self::find_by_email(db, email).await?;

        let token = Uuid::new_v4().to_string();
        let expiry = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        let mut active: users::ActiveModel = user.into();
        active.reset_token = Set(Some(token.clone()));
        active.reset_token_expiry = Set(Some(expiry));

        with_timeout(active.update(db)).await?;

        Ok((token, expiry))
    }

    pub async fn find_by_reset_token(
        db: &DatabaseConnection,
        token: &str,
    ) -> Result<users::Model, StoreError> {
        let user = with_timeout(
            Users::find()
                .filter(UserColumn::ResetToken.eq(token))
                .one(db),
        )
        .await?;

        user.ok_or(StoreError::NotFound)
    }

    /// Pose le nouveau hash et invalide le token en une seule mise à jour.
    pub async fn clear_reset_token_and_set_password(
        db: &DatabaseConnection,
        user: users::Model,
        new_hash: String,
    ) -> Result<users::Model, StoreError> {
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(Some(new_hash));
        active.reset_token = Set(None);
        active.reset_token_expiry = Set(None);

        with_timeout(active.update(db)).await
    }
}
