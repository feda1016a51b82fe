use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!("Database ready, migrations applied");
    Ok(pool)
}
