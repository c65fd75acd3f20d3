use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::catalog::{load_catalog, Catalog, ProductRecord};
use crate::config::{RecommenderConfig, StoreConfig};
use crate::error::{RecommendError, Result};
use crate::search::{cosine_similarity, top_k, TextVectorizer, TfidfModel};

pub const DEFAULT_TOP_N: usize = 5;

/// Selected products scoring below this are dropped from the response.
pub const MIN_RANK_SCORE: f32 = 0.05;

/// One ranked product as returned to callers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecommendationItem {
    pub rank_score: f32,
    pub product_name: String,
    pub report_no: String,
    #[serde(rename = "raw_materials")]
    pub raw_materials_text: String,
    pub manufacturer: String,
    pub nutrient_text: String,
}

impl RecommendationItem {
    fn from_record(record: &ProductRecord, rank_score: f32) -> Self {
        Self {
            rank_score,
            product_name: record.product_name.clone(),
            report_no: record.report_no.clone(),
            raw_materials_text: record.raw_materials_text.clone(),
            manufacturer: record.manufacturer.clone(),
            nutrient_text: record.nutrient_text.clone(),
        }
    }
}

/// Ranks catalog products against free-text queries.
///
/// Built once at startup and read-only afterwards, so one instance can be
/// shared across threads behind an `Arc`. When either the vectorizer or the
/// catalog failed to load, every search answers with an empty list.
pub struct ProductRecommender {
    vectorizer: Option<Box<dyn TextVectorizer>>,
    catalog: Catalog,
    ready: bool,
}

impl ProductRecommender {
    /// Loads the vectorizer asset and the catalog. Failures are logged and
    /// leave the recommender in degraded mode rather than aborting.
    pub fn initialize(model_asset_path: &Path, store: &StoreConfig) -> Self {
        info!("Initializing product recommender...");
        let vectorizer = match TfidfModel::load(model_asset_path) {
            Ok(model) => {
                info!(
                    vocabulary = model.vocabulary_size(),
                    "vectorizer loaded from {}",
                    model_asset_path.display()
                );
                Some(Box::new(model) as Box<dyn TextVectorizer>)
            }
            Err(e) => {
                error!("{}; search is disabled", e);
                None
            }
        };
        let catalog = load_catalog(store);
        Self::from_parts(vectorizer, catalog)
    }

    pub fn from_config(config: &RecommenderConfig) -> Self {
        Self::initialize(&config.model_path, &config.store)
    }

    /// [`ProductRecommender::from_config`] on the blocking pool. Loading
    /// reads the asset file and the whole product table.
    pub async fn spawn_from_config(
        config: RecommenderConfig,
    ) -> std::result::Result<Self, tokio::task::JoinError> {
        tokio::task::spawn_blocking(move || Self::from_config(&config)).await
    }

    pub fn from_parts(vectorizer: Option<Box<dyn TextVectorizer>>, catalog: Catalog) -> Self {
        let ready = vectorizer.is_some() && catalog.is_ready();
        if ready {
            info!(products = catalog.len(), "product recommender ready");
        } else {
            warn!(
                vectorizer_loaded = vectorizer.is_some(),
                products = catalog.len(),
                "product recommender not ready; searches will return no results"
            );
        }
        Self {
            vectorizer,
            catalog,
            ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn vocabulary_size(&self) -> Option<usize> {
        self.vectorizer.as_ref().map(|v| v.vocabulary_size())
    }

    /// Returns up to `top_n` products most similar to `query_text`, best first.
    ///
    /// Never fails: processing errors are logged and yield an empty list.
    pub fn search(&self, query_text: &str, top_n: usize) -> Vec<RecommendationItem> {
        match self.try_search(query_text, top_n) {
            Ok(items) => items,
            Err(e) => {
                error!(query = %query_text, "search failed: {}", e);
                Vec::new()
            }
        }
    }

    /// [`search`](Self::search) with the processing error surfaced.
    ///
    /// Equal scores are ordered by catalog position, earliest first. The
    /// [`MIN_RANK_SCORE`] floor is applied after the `top_n` cut, so fewer
    /// than `top_n` items may come back.
    pub fn try_search(&self, query_text: &str, top_n: usize) -> Result<Vec<RecommendationItem>> {
        let vectorizer = match &self.vectorizer {
            Some(v) if self.ready => v,
            _ => {
                debug!("search requested while not ready");
                return Ok(Vec::new());
            }
        };
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let catalog_vectors = self
            .catalog
            .search_texts()
            .par_iter()
            .map(|text| vectorizer.transform(text))
            .collect::<Result<Vec<_>>>()?;
        let query_vector = vectorizer.transform(query_text)?;

        let scores: Vec<f32> = catalog_vectors
            .par_iter()
            .map(|doc| cosine_similarity(&query_vector, doc))
            .collect();
        if let Some(pos) = scores.iter().position(|s| !s.is_finite()) {
            return Err(RecommendError::QueryProcessing(format!(
                "similarity for catalog position {} is {}",
                pos, scores[pos]
            )));
        }

        let results: Vec<RecommendationItem> = top_k(&scores, top_n)
            .into_iter()
            .filter(|&(_, score)| score >= MIN_RANK_SCORE)
            .filter_map(|(pos, score)| {
                self.catalog
                    .get(pos)
                    .map(|record| RecommendationItem::from_record(record, score))
            })
            .collect();

        debug!(
            query = %query_text,
            top_n,
            returned = results.len(),
            "search complete"
        );
        Ok(results)
    }
}
