// connexion BD
//
// La connexion initiale est supervisée : retry avec backoff exponentiel
// borné (1s, 2s, 4s, 8s) avant d'abandonner. Après le démarrage, les
// opérations du store signalent elles-mêmes Unavailable/Timeout
// (voir services/store.rs).

use sea_orm::{Database, DatabaseConnection, DbErr};
use std::env;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 5;
const MAX_DELAY: Duration = Duration::from_secs(8);

pub async fn establish_connection() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in .env file");

    let mut delay = Duration::from_secs(1);

    for attempt in 1..=MAX_ATTEMPTS {
        match Database::connect(&database_url).await {
            Ok(db) => return Ok(db),
            Err(e) if attempt < MAX_ATTEMPTS => {
                eprintln!(
                    "⚠️  DB connection attempt {}/{} failed: {} (retrying in {:?})",
                    attempt, MAX_ATTEMPTS, e, delay
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("loop returns on the last attempt")
}
