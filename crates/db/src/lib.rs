use std::time::Duration;

use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;

pub use db_migration::DEFAULT_RANK_ID;
pub use sea_orm::{DatabaseConnection as DbPool, DbErr, TransactionTrait};

pub mod entities;
pub mod models;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    /// Connects and brings the schema up to date, seeding the default rank.
    pub async fn new(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .connect_timeout(CONNECT_TIMEOUT)
            .sqlx_logging(false);
        let pool = Database::connect(options).await?;
        db_migration::Migrator::up(&pool, None).await?;
        tracing::info!(backend = ?pool.get_database_backend(), "Database ready");
        Ok(DBService { pool })
    }
}
