use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::{
    RecommenderConfig, ServerConfig, StoreConfig, DEFAULT_BIND_ADDR, DEFAULT_DATABASE_PATH,
    DEFAULT_HTTP_TOP_N, DEFAULT_MAX_TOP_N, DEFAULT_MODEL_PATH, DEFAULT_TABLE,
};
use crate::product_recommender::DEFAULT_TOP_N;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the bincode TF-IDF vectorizer asset
    #[arg(long, env = "RECOMMENDER_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Path to the SQLite product store
    #[arg(long, env = "RECOMMENDER_DATABASE", default_value = DEFAULT_DATABASE_PATH)]
    pub database: PathBuf,

    /// Product table name
    #[arg(long, env = "RECOMMENDER_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve recommendations over HTTP
    Serve {
        #[arg(long, env = "RECOMMENDER_BIND", default_value = DEFAULT_BIND_ADDR)]
        bind: SocketAddr,

        /// Result count when a request does not specify top_n
        #[arg(long, default_value_t = DEFAULT_HTTP_TOP_N)]
        default_top_n: usize,

        /// Upper bound applied to requested top_n
        #[arg(long, default_value_t = DEFAULT_MAX_TOP_N)]
        max_top_n: usize,
    },
    /// Run a single query and print the results as JSON
    Search {
        #[arg(short, long)]
        query: String,

        #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
    },
    /// Load products from a CSV export into the store
    Import {
        #[arg(long)]
        csv: PathBuf,

        /// Clear the table before inserting
        #[arg(long)]
        replace: bool,
    },
}

impl Cli {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.database.clone(), self.table.clone())
    }

    pub fn recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig {
            model_path: self.model.clone(),
            store: self.store_config(),
        }
    }
}

impl Command {
    pub fn server_config(&self) -> Option<ServerConfig> {
        match self {
            Command::Serve {
                bind,
                default_top_n,
                max_top_n,
            } => Some(ServerConfig {
                bind_addr: *bind,
                default_top_n: *default_top_n,
                max_top_n: *max_top_n,
            }),
            _ => None,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
