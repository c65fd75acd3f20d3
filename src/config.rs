use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_MODEL_PATH: &str = "tfidf_vectorizer.bin";
pub const DEFAULT_DATABASE_PATH: &str = "products.db";
pub const DEFAULT_TABLE: &str = "products";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// The endpoint answers with six products unless the caller asks otherwise.
pub const DEFAULT_HTTP_TOP_N: usize = 6;
pub const DEFAULT_MAX_TOP_N: usize = 50;

/// Log filter used when `RUST_LOG` is unset, blank or unparsable.
pub const DEFAULT_LOG_DIRECTIVE: &str = "product_recommender=info";

/// Where the product table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub table: String,
}

impl StoreConfig {
    pub fn new(database_path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            table: table.into(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_PATH, DEFAULT_TABLE)
    }
}

/// Everything needed to bring a recommender up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommenderConfig {
    pub model_path: PathBuf,
    pub store: StoreConfig,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            store: StoreConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub default_top_n: usize,
    pub max_top_n: usize,
}

impl ServerConfig {
    /// Requested result count after applying the default and the upper bound.
    pub fn effective_top_n(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_top_n)
            .min(self.max_top_n)
    }
}

/// Builds the log filter from a `RUST_LOG` value. A usable value is taken as
/// is, so it can raise or lower this crate's level too.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}
