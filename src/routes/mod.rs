pub mod health;
pub mod market;
pub mod users;
pub mod pricing;

use actix_web::{HttpResponse, web};

use crate::services::store::StoreError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(market::market_data)
            .configure(users::users_routes)
            .configure(pricing::pricing_routes)
    );
}

/// Traduction par défaut StoreError -> réponse HTTP.
/// Les handlers qui ont une sémantique particulière (login 404/401,
/// pricing 200-avec-existant) matchent les variants eux-mêmes avant
/// de déléguer ici.
pub(crate) fn store_error_response(err: StoreError) -> HttpResponse {
    match err {
        StoreError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "message": "User not found",
            "status": 404
        })),
        StoreError::Conflict => HttpResponse::Conflict().json(serde_json::json!({
            "success": false,
            "message": "Email already registered",
            "status": 409
        })),
        StoreError::Timeout => HttpResponse::GatewayTimeout().json(serde_json::json!({
            "success": false,
            "message": "Store operation timed out",
            "status": 504
        })),
        StoreError::Unavailable(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "success": false,
            "message": "Store unavailable",
            "status": 503,
            "error": e
        })),
        StoreError::Backend(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "message": "Server error",
            "status": 500,
            "error": e.to_string()
        })),
    }
}

/// 400 uniforme pour un champ requis manquant
pub(crate) fn missing_field_response(field: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "message": format!("{} is required", field),
        "status": 400
    }))
}
