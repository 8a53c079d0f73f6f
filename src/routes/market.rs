use actix_web::{get, web, HttpResponse};
use chrono::Utc;

use crate::services::quote_service::QuoteService;

/// Les deux symboles servis par l'endpoint market-data
pub const SYMBOL_SPX: &str = "SPX";
pub const SYMBOL_SPY: &str = "SPY";

/// GET /market-data - Niveaux techniques combinés SPX + SPY (PUBLIC)
///
/// Les deux fetchs partent en parallèle : la latence totale est bornée
/// par le plus lent des deux appels, pas par leur somme. Les échecs
/// par symbole sont déjà absorbés par le fallback synthétique de
/// QuoteService, donc ce handler ne produit jamais de 500 lui-même.
#[get("/market-data")]
pub async fn market_data(quotes: web::Data<QuoteService>) -> HttpResponse {
    println!(
        "📥 [{}] Received request for market data",
        Utc::now().to_rfc3339()
    );

    let (spx, spy) = futures::join!(
        quotes.fetch_market_data(SYMBOL_SPX),
        quotes.fetch_market_data(SYMBOL_SPY),
    );

    println!(
        "✅ [{}] Successfully processed market data request",
        Utc::now().to_rfc3339()
    );

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "spx": spx,
            "spy": spy
        },
        "timestamp": Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_envelope_always_contains_both_symbols() {
        // Provider injoignable : les deux symboles passent par le fallback,
        // l'enveloppe doit quand même contenir exactement spx et spy
        let quotes = QuoteService::with_base_url("http://127.0.0.1:9");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(quotes))
                .service(market_data),
        )
        .await;

        let req = test::TestRequest::get().uri("/market-data").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        let data = body["data"].as_object().unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.contains_key("spx"));
        assert!(data.contains_key("spy"));
        assert_eq!(body["data"]["spx"]["isRealData"], false);
        assert_eq!(body["data"]["spy"]["symbol"], "SPY");
    }
}
