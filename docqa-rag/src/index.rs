//! Exact nearest-neighbor search over unit vectors.
//!
//! [`VectorIndex`] is the seam between retrieval and the search structure.
//! [`FlatIndex`] is the brute-force implementation: every query is scored
//! against every stored vector by inner product, which equals cosine
//! similarity because all vectors are L2-normalized on the way in.

use std::cmp::Ordering;

use crate::embedding::inner_product;
use crate::error::{RagError, Result};

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index position of the hit, or `None` for an empty result slot.
    ///
    /// Callers must skip `None` entries; they never refer to a chunk.
    pub position: Option<usize>,
    /// Inner-product similarity, higher is better.
    pub score: f32,
}

/// An append-only collection of vectors searchable by similarity.
///
/// Positions are assigned sequentially from zero in insertion order and are
/// never reused or reordered.
pub trait VectorIndex: Send + Sync {
    /// Dimensionality every stored vector must have.
    fn dimensions(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors. Either all are added or, on error, none are.
    fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()>;

    /// Return at most `k` hits ordered by descending score.
    ///
    /// Equal scores are ordered by ascending position.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// Brute-force inner-product index over a row-major `len × dimensions` buffer.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{FlatIndex, VectorIndex};
///
/// let mut index = FlatIndex::new(384);
/// index.add(embeddings)?;
/// let hits = index.search(&query_embedding, 5)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatIndex {
    dimensions: usize,
    len: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, len: 0, data: Vec::new() }
    }

    /// Rebuild an index from a row-major buffer of `len × dimensions` values.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexCorrupt`] if the buffer size disagrees with
    /// `len × dimensions`.
    pub fn from_raw(dimensions: usize, len: usize, data: Vec<f32>) -> Result<Self> {
        let expected = dimensions.checked_mul(len).ok_or_else(|| {
            RagError::IndexCorrupt(format!("{len} vectors of {dimensions} dimensions overflow"))
        })?;
        if data.len() != expected {
            return Err(RagError::IndexCorrupt(format!(
                "vector buffer holds {} values, expected {len} × {dimensions} = {expected}",
                data.len()
            )));
        }
        Ok(Self { dimensions, len, data })
    }

    /// The row-major vector buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The vector stored at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        (position < self.len)
            .then(|| &self.data[position * self.dimensions..(position + 1) * self.dimensions])
    }

    fn check_dimensions(&self, actual: usize) -> Result<()> {
        if actual != self.dimensions {
            return Err(RagError::DimensionMismatch { expected: self.dimensions, actual });
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.len
    }

    fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        for vector in &vectors {
            self.check_dimensions(vector.len())?;
        }
        self.data.reserve(vectors.len() * self.dimensions);
        for vector in &vectors {
            self.data.extend_from_slice(vector);
        }
        self.len += vectors.len();
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimensions(query.len())?;
        if k == 0 || self.len == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len)
            .filter_map(|position| {
                self.vector(position).map(|vector| (position, inner_product(vector, query)))
            })
            .collect();

        scored.sort_by(|a, b| by_score_then_position(*a, *b));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| Neighbor { position: Some(position), score })
            .collect())
    }
}

/// Descending score, ascending position. NaN scores sort last.
fn by_score_then_position(a: (usize, f32), b: (usize, f32)) -> Ordering {
    match (a.1.is_nan(), b.1.is_nan()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)),
    }
}
