use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Loads `.env.test`, starts logging and creates a fresh, fully migrated database at `url`.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("mkt_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}
