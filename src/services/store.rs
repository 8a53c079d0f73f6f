use sea_orm::{DbErr, SqlErr};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Deadline appliquée à chaque opération du store
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Erreurs typées du store, matchées par les handlers HTTP.
/// Les handlers ne doivent JAMAIS déduire le genre d'erreur depuis le
/// texte du message : le variant fait foi.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("email already registered")]
    Conflict,
    #[error("store operation timed out after {}s", STORE_TIMEOUT.as_secs())]
    Timeout,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Backend(DbErr),
}

/// Traduit une DbErr SeaORM en variant structuré :
/// - erreurs de connexion/pool -> Unavailable
/// - violation de contrainte UNIQUE -> Conflict (seule source de vérité
///   pour les emails en doublon, pas de find préalable)
/// - le reste -> Backend
pub(crate) fn map_db_err(e: DbErr) -> StoreError {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
        return StoreError::Conflict;
    }

    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Backend(other),
    }
}

/// Exécute une opération SeaORM sous la deadline du store.
/// Un dépassement devient Timeout, distinct de Unavailable.
pub(crate) async fn with_timeout<T, F>(fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, DbErr>>,
{
    match timeout(STORE_TIMEOUT, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(map_db_err(e)),
        Err(_) => Err(StoreError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_connection_errors_map_to_unavailable() {
        let e = DbErr::Conn(RuntimeErr::Internal("pool closed".to_string()));
        assert!(matches!(map_db_err(e), StoreError::Unavailable(_)));
    }

    #[test]
    fn test_other_errors_map_to_backend() {
        let e = DbErr::Custom("boom".to_string());
        assert!(matches!(map_db_err(e), StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_immediate_results_pass_through() {
        let ok = with_timeout(async { Ok::<_, DbErr>(42) }).await;
        assert_eq!(ok.unwrap(), 42);

        let err = with_timeout(async { Err::<i32, _>(DbErr::Custom("x".to_string())) }).await;
        assert!(matches!(err.unwrap_err(), StoreError::Backend(_)));
    }
}
