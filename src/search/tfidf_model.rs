use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{RecommendError, Result};
use crate::search::sparse_vector::SparseVector;

/// Bumped whenever the serialized layout changes.
pub const ASSET_FORMAT_VERSION: u32 = 1;

/// Matches runs of two or more word characters.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Maps text into a fixed sparse vector space.
///
/// Implementations must be read-only: the same text always yields the same
/// vector, and concurrent calls are allowed.
pub trait TextVectorizer: Send + Sync {
    fn transform(&self, text: &str) -> Result<SparseVector>;

    /// Number of columns in the vector space.
    fn vocabulary_size(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Norm {
    L1,
    L2,
}

/// Analyzer and weighting options fixed when the model was fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerOptions {
    pub lowercase: bool,
    pub token_pattern: String,
    /// Inclusive word n-gram range, e.g. `(1, 2)` for unigrams and bigrams.
    pub ngram_range: (usize, usize),
    /// Replace raw term counts with `1 + ln(count)`.
    pub sublinear_tf: bool,
    pub norm: Option<Norm>,
}

impl Default for VectorizerOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            ngram_range: (1, 1),
            sublinear_tf: false,
            norm: Some(Norm::L2),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TfidfAsset {
    format_version: u32,
    options: VectorizerOptions,
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
}

/// A fitted TF-IDF vectorizer loaded from a bincode asset.
#[derive(Debug)]
pub struct TfidfModel {
    options: VectorizerOptions,
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
    token_regex: Regex,
}

impl TfidfModel {
    /// Assembles a model from already fitted parts, validating them the same
    /// way [`TfidfModel::load`] does.
    pub fn new(
        options: VectorizerOptions,
        vocabulary: HashMap<String, u32>,
        idf: Vec<f32>,
    ) -> Result<Self> {
        if options.ngram_range.0 == 0 || options.ngram_range.0 > options.ngram_range.1 {
            return Err(RecommendError::InvalidModel(format!(
                "invalid n-gram range {:?}",
                options.ngram_range
            )));
        }
        if idf.len() != vocabulary.len() {
            return Err(RecommendError::InvalidModel(format!(
                "vocabulary has {} terms but idf has {} weights",
                vocabulary.len(),
                idf.len()
            )));
        }
        if let Some((term, &index)) = vocabulary
            .iter()
            .find(|(_, index)| **index as usize >= idf.len())
        {
            return Err(RecommendError::InvalidModel(format!(
                "term '{}' maps to column {} outside of {} columns",
                term,
                index,
                idf.len()
            )));
        }
        if let Some(pos) = idf.iter().position(|w| !w.is_finite() || *w < 0.0) {
            return Err(RecommendError::InvalidModel(format!(
                "idf weight at column {} is {}",
                pos, idf[pos]
            )));
        }
        let token_regex = Regex::new(&options.token_pattern).map_err(|e| {
            RecommendError::InvalidModel(format!(
                "invalid token pattern '{}': {}",
                options.token_pattern, e
            ))
        })?;

        Ok(Self {
            options,
            vocabulary,
            idf,
            token_regex,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RecommendError::asset_load(path, "file not found"));
        }
        let bytes = fs::read(path).map_err(|e| RecommendError::asset_load(path, e))?;
        let asset: TfidfAsset =
            bincode::deserialize(&bytes).map_err(|e| RecommendError::asset_load(path, e))?;
        if asset.format_version != ASSET_FORMAT_VERSION {
            return Err(RecommendError::asset_load(
                path,
                format!(
                    "unsupported format version {} (expected {})",
                    asset.format_version, ASSET_FORMAT_VERSION
                ),
            ));
        }
        Self::new(asset.options, asset.vocabulary, asset.idf).map_err(|e| match e {
            RecommendError::InvalidModel(reason) => RecommendError::asset_load(path, reason),
            other => other,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let asset = TfidfAsset {
            format_version: ASSET_FORMAT_VERSION,
            options: self.options.clone(),
            vocabulary: self.vocabulary.clone(),
            idf: self.idf.clone(),
        };
        let bytes = bincode::serialize(&asset).map_err(|e| RecommendError::asset_load(path, e))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn options(&self) -> &VectorizerOptions {
        &self.options
    }

    pub fn column_of(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    /// Splits text into the terms the vocabulary is keyed by.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.options.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = self
            .token_regex
            .find_iter(&text)
            .map(|m| m.as_str())
            .collect();

        let (min_n, max_n) = self.options.ngram_range;
        if (min_n, max_n) == (1, 1) {
            return tokens.into_iter().map(String::from).collect();
        }
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

impl TextVectorizer for TfidfModel {
    fn transform(&self, text: &str) -> Result<SparseVector> {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for term in self.analyze(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let weighted = counts.into_iter().map(|(column, count)| {
            let tf = if self.options.sublinear_tf {
                1.0 + count.ln()
            } else {
                count
            };
            (column, tf * self.idf[column as usize])
        });
        let vector = SparseVector::from_sorted_pairs(weighted);

        if vector.values().iter().any(|v| !v.is_finite()) {
            return Err(RecommendError::QueryProcessing(format!(
                "non-finite weight while vectorizing {:?}",
                text
            )));
        }

        Ok(match self.options.norm {
            Some(Norm::L2) => vector.l2_normalized(),
            Some(Norm::L1) => vector.l1_normalized(),
            None => vector,
        })
    }

    fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}
