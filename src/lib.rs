//! Free-text product search over an in-memory catalog.
//!
//! - `catalog`: loads product rows from the SQLite store (and seeds it from CSV).
//! - `search`: TF-IDF vectorizer asset, sparse vectors, cosine scoring.
//! - `product_recommender`: the ranker tying model and catalog together.
//! - `server`: axum endpoints in front of the ranker.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod product_recommender;
pub mod search;
pub mod server;

pub use error::{RecommendError, Result};
pub use product_recommender::{ProductRecommender, RecommendationItem};
