pub mod sparse_vector;
pub mod tfidf_model;

pub use sparse_vector::{cosine_similarity, top_k, SparseVector};
pub use tfidf_model::{Norm, TextVectorizer, TfidfModel, VectorizerOptions};
