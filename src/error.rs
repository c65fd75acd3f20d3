use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between loading the model, reading the
/// product store and answering a query.
///
/// The recommender absorbs these at its boundary and degrades to empty
/// results; they surface directly only through the typed `try_*` entry
/// points and the import tool.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// The vectorizer asset is missing, unreadable or inconsistent.
    #[error("failed to load vectorizer asset {path:?}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    /// Model parts that do not fit together (sizes, columns, weights, pattern).
    #[error("invalid vectorizer model: {0}")]
    InvalidModel(String),

    /// The product store could not be opened or queried.
    #[error("product store error: {0}")]
    StoreConnect(#[from] rusqlite::Error),

    #[error("invalid table name '{0}'")]
    InvalidTable(String),

    /// The store answered but holds nothing to rank against.
    #[error("table '{table}' contains no products")]
    EmptyCatalog { table: String },

    #[error("query processing failed: {0}")]
    QueryProcessing(String),

    #[error("CSV import error: {0}")]
    CsvImport(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecommendError {
    pub fn asset_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RecommendError::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
