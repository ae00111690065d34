use anyhow::Context;

use crate::cli::utils::{format_forest, output_empty_collection};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::model::ObjectKind;
use crate::query::{ensure_nestable, ObjectQueries};
use crate::store;

pub async fn tree(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let store = store::connect(&config.database)
        .await
        .context("failed to open object store")?;
    let queries = ObjectQueries::new(store, config.api.default_page_size, config.api.max_page_size);
    let forest = queries.forest().await.context("failed to load objects")?;

    if forest.is_empty() {
        return output_empty_collection(&output_format, "objects", "No objects found");
    }

    match output_format {
        OutputFormat::Json => {
            ensure_nestable(&forest)?;
            println!("{}", serde_json::to_string_pretty(&forest)?)
        }
        OutputFormat::Text => print!("{}", format_forest(&forest)),
    }
    Ok(())
}

pub fn types(output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ObjectKind::ALL)?),
        OutputFormat::Text => {
            for kind in ObjectKind::ALL {
                println!("{}", kind);
            }
        }
    }
    Ok(())
}
