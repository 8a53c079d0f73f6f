use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::models::dto::AccountSummary;
use crate::routes::{missing_field_response, store_error_response};
use crate::services::store::StoreError;
use crate::services::user_service::UserService;
use crate::utils::password;

// DTO pour check/forgot-password (email seul)
#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: Option<String>,
}

// DTO pour l'inscription et la connexion
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// DTO pour reset-password
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// POST /users/check - Vérifier si un compte existe (PUBLIC)
#[post("/check")]
pub async fn check_user(
    body: web::Json<EmailRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let Some(email) = body.email.as_deref() else {
        return missing_field_response("Email");
    };

    match UserService::find_by_email(db.get_ref(), email).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "User exists",
            "status": 200,
            "data": AccountSummary::from(&user)
        })),
        Err(e) => store_error_response(e),
    }
}

/// POST /users/signup - Créer un compte (PUBLIC)
#[post("/signup")]
pub async fn signup(
    body: web::Json<CredentialsRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Valider les champs requis
    let Some(email) = body.email.as_deref() else {
        return missing_field_response("Email");
    };
    let Some(plaintext) = body.password.as_deref() else {
        return missing_field_response("Password");
    };

    // 2. Hash le mot de passe
    let password_hash = match password::hash_password(plaintext) {
        Ok(hash) => hash,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "message": format!("Failed to hash password: {}", e),
                "status": 500
            }));
        }
    };

    // 3. Insert direct : un doublon remonte en Conflict via la contrainte
    //    UNIQUE, pas de check préalable
    match UserService::create(db.get_ref(), email, Some(password_hash)).await {
        Ok(user) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "message": "User created successfully",
            "status": 201,
            "data": AccountSummary::from(&user)
        })),
        Err(e) => store_error_response(e),
    }
}

/// POST /users/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<CredentialsRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let Some(email) = body.email.as_deref() else {
        return missing_field_response("Email");
    };
    let Some(plaintext) = body.password.as_deref() else {
        return missing_field_response("Password");
    };

    // 1. Trouver le compte (email inconnu -> 404, distinct du 401)
    let user = match UserService::find_by_email(db.get_ref(), email).await {
        Ok(user) => user,
        Err(e) => return store_error_response(e),
    };

    // 2. Vérifier le mot de passe (false sur mismatch, jamais d'erreur)
    if !UserService::verify_credentials(&user, plaintext) {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "message": "Invalid email or password",
            "status": 401
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Login successful",
        "status": 200,
        "data": AccountSummary::from(&user)
    }))
}

/// POST /users/forgot-password - Générer un token de reset (PUBLIC)
///
/// Le token est renvoyé directement dans la réponse au lieu de partir
/// par email. C'est un raccourci de développement assumé, voir DESIGN.md.
#[post("/forgot-password")]
pub async fn forgot_password(
    body: web::Json<EmailRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let Some(email) = body.email.as_deref() else {
        return missing_field_response("Email");
    };

    match UserService::set_reset_token(db.get_ref(), email).await {
        Ok((token, expiry)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Password reset token generated",
            "status": 200,
            "data": {
                "resetToken": token,
                "expiresAt": expiry.to_rfc3339()
            }
        })),
        Err(e) => store_error_response(e),
    }
}

/// POST /users/reset-password - Changer le mot de passe via token (PUBLIC)
#[post("/reset-password")]
pub async fn reset_password(
    body: web::Json<ResetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let Some(token) = body.token.as_deref() else {
        return missing_field_response("Token");
    };
    let Some(plaintext) = body.password.as_deref() else {
        return missing_field_response("Password");
    };

    let invalid_token = || {
        HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": "Invalid or expired reset token",
            "status": 400
        }))
    };

    // 1. Retrouver le compte par token (inconnu -> 400, pas 404 : on ne
    //    distingue pas token inexistant et token expiré)
    let user = match UserService::find_by_reset_token(db.get_ref(), token).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return invalid_token(),
        Err(e) => return store_error_response(e),
    };

    // 2. Vérifier l'expiration AVANT toute mutation du hash
    match user.reset_token_expiry {
        Some(expiry) if expiry > Utc::now() => {}
        _ => return invalid_token(),
    }

    // 3. Hasher le nouveau mot de passe
    let new_hash = match password::hash_password(plaintext) {
        Ok(hash) => hash,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "message": format!("Failed to hash password: {}", e),
                "status": 500
            }));
        }
    };

    // 4. Poser le hash et invalider le token en une seule update
    match UserService::clear_reset_token_and_set_password(db.get_ref(), user, new_hash).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Password reset successfully",
            "status": 200,
            "data": AccountSummary::from(&user)
        })),
        Err(e) => store_error_response(e),
    }
}

pub fn users_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(check_user)
            .service(signup)
            .service(login)
            .service(forgot_password)
            .service(reset_password)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::models::users;

    // La validation des champs se joue avant tout accès au store :
    // une connexion jamais établie suffit pour ces tests
    fn disconnected_db() -> web::Data<DatabaseConnection> {
        web::Data::new(DatabaseConnection::Disconnected)
    }

    #[actix_web::test]
    async fn test_check_without_email_is_400() {
        let app = test::init_service(
            App::new()
                .app_data(disconnected_db())
                .configure(users_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/users/check")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_signup_without_password_is_400() {
        let app = test::init_service(
            App::new()
                .app_data(disconnected_db())
                .configure(users_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/users/signup")
            .set_json(serde_json::json!({ "email": "bob@example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 400);
        assert_eq!(body["message"], "Password is required");
    }

    #[actix_web::test]
    async fn test_reset_password_with_expired_token_is_400_and_writes_nothing() {
        let expired_user = users::Model {
            id: 7,
            email: "carol@example.com".to_string(),
            password_hash: Some("pbkdf2:sha256:260000$salt$hash".to_string()),
            created_at: Utc::now(),
            reset_token: Some("3f2c8a1e-0000-4000-8000-000000000000".to_string()),
            reset_token_expiry: Some(Utc::now() - Duration::hours(2)),
        };

        // Une seule réponse mockée : le SELECT par token. Si le handler
        // tentait un UPDATE malgré l'expiration, il apparaîtrait dans le
        // transaction log
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![expired_user]])
            .into_connection();
        let db = web::Data::new(db);

        let app = test::init_service(
            App::new()
                .app_data(db.clone())
                .configure(users_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/users/reset-password")
            .set_json(serde_json::json!({
                "token": "3f2c8a1e-0000-4000-8000-000000000000",
                "password": "brand-new-password"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid or expired reset token");

        // Un seul statement est parti vers le store : aucune mutation du hash
        drop(app);
        let db = std::sync::Arc::try_unwrap(db.into_inner())
            .ok()
            .expect("mock connection still shared");
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[actix_web::test]
    async fn test_reset_password_without_token_is_400() {
        let app = test::init_service(
            App::new()
                .app_data(disconnected_db())
                .configure(users_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/users/reset-password")
            .set_json(serde_json::json!({ "password": "newpass" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
    }
}
