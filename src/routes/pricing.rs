use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::models::dto::AccountSummary;
use crate::routes::{missing_field_response, store_error_response};
use crate::services::pricing_service::PricingService;
use crate::services::store::StoreError;

// DTO commun aux deux endpoints pricing (capture d'email seulement)
#[derive(Deserialize)]
pub struct PricingRequest {
    pub email: Option<String>,
}

/// POST /pricing/check - Vérifier si un email est déjà capturé (PUBLIC)
#[post("/check")]
pub async fn check_user(
    body: web::Json<PricingRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let Some(email) = body.email.as_deref() else {
        return missing_field_response("Email");
    };

    match PricingService::find_by_email(db.get_ref(), email).await {
        Ok(entry) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "User exists",
            "status": 200,
            "data": AccountSummary::from(&entry)
        })),
        Err(e) => store_error_response(e),
    }
}

/// POST /pricing/create - Capturer un email pour la waitlist (PUBLIC)
///
/// Variante capture : un email déjà présent n'est pas un 409 mais un
/// 200 avec l'entrée existante (et aucune écriture en doublon).
#[post("/create")]
pub async fn create_user(
    body: web::Json<PricingRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let Some(email) = body.email.as_deref() else {
        return missing_field_response("Email");
    };

    match PricingService::create(db.get_ref(), email).await {
        Ok(entry) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "message": "User created successfully",
            "status": 201,
            "data": AccountSummary::from(&entry)
        })),
        // Doublon détecté par la contrainte UNIQUE : renvoyer l'existant
        Err(StoreError::Conflict) => {
            match PricingService::find_by_email(db.get_ref(), email).await {
                Ok(existing) => HttpResponse::Ok().json(serde_json::json!({
                    "success": true,
                    "message": "User already exists",
                    "status": 200,
                    "data": AccountSummary::from(&existing)
                })),
                Err(e) => store_error_response(e),
            }
        }
        Err(e) => store_error_response(e),
    }
}

pub fn pricing_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/pricing")
            .service(check_user)
            .service(create_user)
    );
}
