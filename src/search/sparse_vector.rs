//! Sparse term vectors and the scoring primitives used by the ranker.
#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

type Float = f32;

/// A sparse vector stored as parallel, index-sorted arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<Float>,
}

impl SparseVector {
    /// Builds a vector from `(index, value)` pairs that are already sorted by
    /// index with no duplicates. Zero entries are dropped.
    pub fn from_sorted_pairs(pairs: impl IntoIterator<Item = (u32, Float)>) -> Self {
        let (indices, values) = pairs.into_iter().filter(|&(_, v)| v != 0.0).unzip();
        let vector = Self { indices, values };
        debug_assert!(vector.indices.windows(2).all(|w| w[0] < w[1]));
        vector
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[Float] {
        &self.values
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, index: u32) -> Float {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    pub fn l2_norm(&self) -> Float {
        self.values.iter().map(|&v| v * v).sum::<Float>().sqrt()
    }

    pub fn l1_norm(&self) -> Float {
        self.values.iter().map(|v| v.abs()).sum()
    }

    /// Scales the vector to unit L2 length. Zero vectors stay zero.
    pub fn l2_normalized(self) -> Self {
        let norm = self.l2_norm();
        self.scaled_by_inverse(norm)
    }

    pub fn l1_normalized(self) -> Self {
        let norm = self.l1_norm();
        self.scaled_by_inverse(norm)
    }

    fn scaled_by_inverse(mut self, norm: Float) -> Self {
        if norm == 0.0 {
            return self;
        }
        let inv_norm = 1.0 / norm;
        self.values.iter_mut().for_each(|v| *v *= inv_norm);
        self
    }

    /// Dot product over the intersection of both index sets.
    pub fn dot(&self, other: &SparseVector) -> Float {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Cosine similarity of two sparse vectors.
///
/// A zero vector on either side scores 0. For non-negative weights the result
/// lies in [0, 1]; it is clamped there to absorb rounding. NaN passes through
/// so callers can reject it.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> Float {
    let denom = a.l2_norm() * b.l2_norm();
    if denom == 0.0 {
        return 0.0;
    }
    let score = a.dot(b) / denom;
    if score.is_nan() {
        score
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[derive(Debug, PartialEq)]
struct ScoredIndex {
    score: Float,
    index: usize,
}

impl Eq for ScoredIndex {}

impl PartialOrd for ScoredIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredIndex {
    // "Greater" means "ranks worse": lower score, then later catalog position.
    // The heap top is therefore the weakest kept entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Returns the `k` best `(index, score)` pairs, best first.
///
/// Equal scores are ordered by ascending index, so the selection is fully
/// determined by its input.
pub fn top_k(scores: &[Float], k: usize) -> Vec<(usize, Float)> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (index, &score) in scores.iter().enumerate() {
        heap.push(ScoredIndex { score, index });
        if heap.len() > k {
            heap.pop();
        }
    }
    heap.into_sorted_vec()
        .into_iter()
        .map(|si| (si.index, si.score))
        .collect()
}
