// Embeddings module
// Collaborator interface for text-to-vector mapping plus the batched,
// bounded-concurrency ingestion pipeline


pub mod ollama;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::index::{Chunk, EmbeddedChunk};
use crate::{Result, TextQaError};

pub use ollama::OllamaClient;

/// Maps batches of texts to fixed-dimension vectors, one per input, in input
/// order. Implementations are remote services or local models; tests use
/// in-process fakes.
pub trait EmbeddingClient: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Cooperative cancellation signal for a long-running embedding run.
/// Checked between batches, never mid-batch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Batch shaping for [`embed_chunks`].
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Batches in flight at once.
    pub max_concurrency: usize,
}

impl Default for EmbedOptions {
    #[inline]
    fn default() -> Self {
        Self {
            batch_size: 16,
            max_concurrency: 4,
        }
    }
}

/// Embed a chunk sequence through `client`, batching requests and running up
/// to `max_concurrency` batches at once on blocking workers.
///
/// Results come back in the original chunk order regardless of which batch
/// finishes first. Any failed batch fails the whole operation; nothing is
/// dropped silently. When `cancel` is set, the run stops between batches
/// with [`TextQaError::Cancelled`].
#[inline]
pub async fn embed_chunks(
    client: Arc<dyn EmbeddingClient>,
    chunks: Vec<Chunk>,
    options: &EmbedOptions,
    cancel: Option<&CancelFlag>,
) -> Result<Vec<EmbeddedChunk>> {
    if options.batch_size == 0 {
        return Err(TextQaError::InvalidInput(
            "batch_size must be greater than zero".to_string(),
        ));
    }
    if options.max_concurrency == 0 {
        return Err(TextQaError::InvalidInput(
            "max_concurrency must be greater than zero".to_string(),
        ));
    }
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let total = chunks.len();
    let batches: Vec<Vec<Chunk>> = chunks
        .chunks(options.batch_size)
        .map(<[Chunk]>::to_vec)
        .collect();
    let batch_count = batches.len();

    debug!(
        "Embedding {} chunks in {} batches (batch_size: {}, concurrency: {})",
        total, batch_count, options.batch_size, options.max_concurrency
    );

    // `buffered` dispatches lazily and yields in stream order, which both
    // bounds in-flight requests and reassembles results in chunk order.
    let mut results = Vec::with_capacity(total);
    let mut batch_stream = stream::iter(batches.into_iter().enumerate())
        .map(|(batch_index, batch)| {
            let client = Arc::clone(&client);
            let cancel = cancel.cloned();
            async move {
                if cancel.is_some_and(|flag| flag.is_cancelled()) {
                    return Err(TextQaError::Cancelled);
                }
                tokio::task::spawn_blocking(move || embed_batch(&*client, batch, batch_index))
                    .await
                    .map_err(|e| {
                        TextQaError::Embedding(format!("embedding worker failed: {}", e))
                    })?
            }
        })
        .buffered(options.max_concurrency);

    while let Some(batch_result) = batch_stream.next().await {
        results.extend(batch_result?);
    }

    debug!("Embedded {} chunks", results.len());
    Ok(results)
}

/// Embed one batch and pair vectors back with their chunks, verifying the
/// response count so a partial batch can never slip through.
fn embed_batch(
    client: &dyn EmbeddingClient,
    batch: Vec<Chunk>,
    batch_index: usize,
) -> Result<Vec<EmbeddedChunk>> {
    let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
    let vectors = client
        .embed(&texts)
        .map_err(|e| TextQaError::Embedding(format!("batch {} failed: {}", batch_index, e)))?;

    if vectors.len() != batch.len() {
        return Err(TextQaError::Embedding(format!(
            "batch {} returned {} vectors for {} texts",
            batch_index,
            vectors.len(),
            batch.len()
        )));
    }

    Ok(batch
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
        .collect())
}

/// Embed a single question as a one-item batch.
#[inline]
pub fn embed_question(client: &dyn EmbeddingClient, question: &str) -> Result<Vec<f32>> {
    let texts = [question.to_string()];
    let vectors = client.embed(&texts)?;
    vectors
        .into_iter()
        .next()
        .ok_or_else(|| TextQaError::Embedding("embedding service returned no vector".to_string()))
}
