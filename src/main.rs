use anyhow::{Context, Result};
use product_recommender::catalog::import_products_csv;
use product_recommender::cli::{parse_args, Command};
use product_recommender::config::log_filter;
use product_recommender::product_recommender::ProductRecommender;
use product_recommender::server::{self, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Settings may come from a .env file
    init_tracing();

    let cli = parse_args();
    let config = cli.recommender_config();

    match &cli.command {
        Command::Serve { .. } => {
            let server_config = cli
                .command
                .server_config()
                .context("serve command without server settings")?;
            info!("Starting product recommender v{}", env!("CARGO_PKG_VERSION"));

            let recommender = ProductRecommender::spawn_from_config(config)
                .await
                .context("Recommender initialization panicked")?;

            let state = AppState::new(Arc::new(recommender), server_config);
            server::serve(state).await?;
        }
        Command::Search { query, top_n } => {
            let recommender = ProductRecommender::spawn_from_config(config)
                .await
                .context("Recommender initialization panicked")?;
            let results = recommender.search(query, *top_n);
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Import { csv, replace } => {
            let count = import_products_csv(csv, &config.store, *replace).with_context(|| {
                format!(
                    "Failed to import products from '{}' into '{}'",
                    csv.display(),
                    config.store.database_path.display()
                )
            })?;
            println!("Imported {} products into table '{}'", count, config.store.table);
        }
    }

    Ok(())
}
