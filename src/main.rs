mod models;
mod routes;
mod db;
mod services;
mod utils;
use actix_web::{App, HttpServer, web};
use crate::services::quote_service::QuoteService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    println!("🔌 Connecting to database...");
    let db = db::establish_connection()
        .await
        .expect("Failed to connect to database");
    println!("✅ Database connected!");

    let quotes = QuoteService::new();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    println!("🚀 Starting server on http://127.0.0.1:{}", port);

    let db = web::Data::new(db);

    HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(web::Data::new(quotes.clone()))
            .configure(routes::configure_routes)
    })
        .bind(("127.0.0.1", port))?
        .run()
        .await
}
