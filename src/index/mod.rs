// Vector index module
// Owns the chunk data model and the in-memory collection with
// nearest-neighbor search; persistence lives in the `store` submodule


pub mod store;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, TextQaError};

/// A bounded slice of a source document's text, the unit of retrieval.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text, including any overlap prefix from chunking.
    pub text: String,
    /// Identifier of the source document, e.g. a file name.
    pub source_id: String,
    /// 0-based position of this chunk within its source.
    pub ordinal: u32,
    /// Total number of chunks produced from this source.
    pub chunk_count: u32,
}

impl Chunk {
    /// Build the chunk sequence for one source document. Ordinals are
    /// contiguous from 0 and every chunk carries the total count.
    #[inline]
    pub fn sequence(source_id: &str, texts: Vec<String>) -> Vec<Chunk> {
        let chunk_count = u32::try_from(texts.len()).unwrap_or(u32::MAX);
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                text,
                source_id: source_id.to_string(),
                ordinal: u32::try_from(i).unwrap_or(u32::MAX),
                chunk_count,
            })
            .collect()
    }

    /// A bounded display preview of the chunk text. Truncation happens on
    /// char boundaries and appends an ellipsis when text was dropped.
    #[inline]
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            return self.text.clone();
        }
        let mut preview: String = self.text.chars().take(max_chars).collect();
        preview.push_str("...");
        preview
    }
}

/// A chunk together with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Entry stored inside a collection: an embedded chunk plus its
/// insertion-order id, which doubles as the search tie-break key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct IndexEntry {
    pub(crate) id: u64,
    pub(crate) chunk: Chunk,
    pub(crate) vector: Vec<f32>,
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Similarity under the collection's metric; higher is better.
    pub score: f32,
}

/// Distance metric of a collection, fixed at build time and persisted with
/// the collection so reloads rank identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity in [-1, 1], higher is more similar.
    Cosine,
}

/// A named set of embedded chunks supporting exact nearest-neighbor search.
///
/// Search is a brute-force scan, which is exact at the scale this crate
/// targets. Callers only depend on the ranked [`SearchResult`] contract, so
/// an approximate structure could replace the scan without interface changes
/// (trading recall for speed).
#[derive(Debug, Clone)]
pub struct Collection {
    pub(crate) name: String,
    pub(crate) dimension: usize,
    pub(crate) metric: DistanceMetric,
    pub(crate) entries: Vec<IndexEntry>,
}

impl Collection {
    /// Build a collection from embedded chunks.
    ///
    /// Fails with [`TextQaError::EmptyInput`] when `chunks` is empty and
    /// [`TextQaError::DimensionMismatch`] when the vectors are not all the
    /// same length.
    #[inline]
    pub fn build(name: &str, chunks: Vec<EmbeddedChunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(TextQaError::EmptyInput);
        }

        let dimension = chunks[0].vector.len();
        if dimension == 0 {
            return Err(TextQaError::InvalidInput(
                "embedding vectors must not be zero-dimensional".to_string(),
            ));
        }

        for embedded in &chunks {
            if embedded.vector.len() != dimension {
                return Err(TextQaError::DimensionMismatch {
                    expected: dimension,
                    actual: embedded.vector.len(),
                });
            }
        }

        let entries = chunks
            .into_iter()
            .enumerate()
            .map(|(i, embedded)| IndexEntry {
                id: i as u64,
                chunk: embedded.chunk,
                vector: embedded.vector,
            })
            .collect::<Vec<_>>();

        debug!(
            "Built collection '{}' with {} entries ({} dimensions)",
            name,
            entries.len(),
            dimension
        );

        Ok(Self {
            name: name.to_string(),
            dimension,
            metric: DistanceMetric::Cosine,
            entries,
        })
    }

    /// Reassemble a collection from persisted parts, re-checking the
    /// dimensionality invariant.
    pub(crate) fn from_parts(
        name: String,
        dimension: usize,
        metric: DistanceMetric,
        entries: Vec<IndexEntry>,
    ) -> Result<Self> {
        if entries.is_empty() {
            return Err(TextQaError::StoreCorrupt {
                name,
                reason: "store contains no entries".to_string(),
            });
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(TextQaError::StoreCorrupt {
                name,
                reason: format!(
                    "entry {} has {} dimensions, expected {}",
                    bad.id,
                    bad.vector.len(),
                    dimension
                ),
            });
        }

        Ok(Self {
            name,
            dimension,
            metric,
            entries,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Return the `k` entries most similar to `query`, best first.
    ///
    /// Ranking is by the collection's fixed metric; equal scores keep
    /// insertion order. When `k` exceeds the entry count, every entry is
    /// returned once, ranked.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(TextQaError::InvalidInput(
                "k must be greater than zero".to_string(),
            ));
        }
        if query.len() != self.dimension {
            return Err(TextQaError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.vector), entry))
            .collect();

        // Stable sort, descending score: ties keep insertion order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let results = scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| SearchResult {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect::<Vec<_>>();

        debug!(
            "Search over '{}' returned {} of {} entries",
            self.name,
            results.len(),
            self.entries.len()
        );

        Ok(results)
    }
}

/// Cosine similarity between two equal-length vectors, in [-1, 1].
/// Zero-norm vectors compare as 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have the same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
