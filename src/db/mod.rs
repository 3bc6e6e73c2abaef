pub mod delivery_partners;
pub mod menu;
pub mod orders;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to Postgres and bring the schema up to date.
pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
