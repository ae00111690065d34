use anyhow::Context;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::store::PgStore;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL must be set to run migrations")?;

    let store = PgStore::connect(url, &config.database)
        .await
        .context("failed to connect to database")?;
    store.migrate().await.context("migration failed")?;
    store.close().await;

    output_success(&output_format, "Object schema is up to date", Some(json!({ "table": "object" })))
}
