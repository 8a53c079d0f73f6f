// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Comptes utilisateurs (email unique + reset password)
//   - pricing : Capture d'emails pour la waitlist pricing (pas de password)
//   - dto : Data Transfer Objects pour les réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - L'unicité de l'email est portée par une contrainte UNIQUE en base,
//     pas par un check applicatif (voir services/user_service.rs)
//   - password_hash et les tokens de reset ne sont jamais sérialisés
//     vers les clients
//
// ============================================================================

pub mod health;
pub mod users;
pub mod pricing;
pub mod dto;
