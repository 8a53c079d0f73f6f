pub mod levels;
pub mod quote_service;
pub mod store;
pub mod user_service;
pub mod pricing_service;
