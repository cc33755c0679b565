pub mod db;
pub mod models;
pub mod repositories;

pub use db::{ChargeOutcome, Database};
pub use sqlx;

use anyhow::Result;

pub async fn connect(url: &str) -> Result<Database> {
    Ok(Database::new(db::init_db(url).await?))
}
