use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::models::pricing::{self, Column as PricingColumn, Entity as Pricing};
use crate::services::store::{StoreError, with_timeout};

pub struct PricingService;

impl PricingService {
    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<pricing::Model, StoreError> {
        let entry = with_timeout(
            Pricing::find()
                .filter(PricingColumn::Email.eq(email))
                .one(db),
        )
        .await?;

        entry.ok_or(StoreError::NotFound)
    }

    /// Insert direct : la contrainte UNIQUE sur email signale le doublon
    /// via StoreError::Conflict (le handler renvoie alors l'entrée
    /// existante avec un 200, sans écrire de doublon).
    pub async fn create(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<pricing::Model, StoreError> {
        let new_entry = pricing::ActiveModel {
            email: Set(email.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        with_timeout(new_entry.insert(db)).await
    }
}
