// Question answering module
// Session state plus the retrieve-then-generate pipeline that grounds
// answers in the active collection


use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::embeddings::{EmbeddingClient, embed_question};
use crate::generation::GenerationClient;
use crate::index::{Collection, SearchResult};
use crate::{Result, TextQaError};

/// A generated answer together with the retrieved chunks it was grounded on,
/// in rank order.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

/// Holds the collection currently active for answering. The collection is
/// swapped atomically, so a question in flight keeps the snapshot it started
/// with even while a new ingestion replaces the active collection.
#[derive(Debug, Default)]
pub struct Session {
    active: RwLock<Option<Arc<Collection>>>,
}

impl Session {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `collection` the active one, replacing any previous collection.
    #[inline]
    pub fn activate(&self, collection: Arc<Collection>) {
        debug!(
            "Activating collection '{}' with {} entries",
            collection.name(),
            collection.len()
        );
        let mut guard = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(collection);
    }

    /// Snapshot of the active collection.
    #[inline]
    pub fn collection(&self) -> Result<Arc<Collection>> {
        let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone().ok_or(TextQaError::IndexNotReady)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    #[inline]
    pub fn clear(&self) {
        let mut guard = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

/// Finds the chunks most similar to a question in the session's active
/// collection.
pub struct Retriever {
    session: Arc<Session>,
    embedder: Arc<dyn EmbeddingClient>,
}

impl Retriever {
    #[inline]
    pub fn new(session: Arc<Session>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self { session, embedder }
    }

    /// Retrieve the `k` chunks closest to `question`, best first.
    ///
    /// The readiness check runs before the question is embedded, so a
    /// session without a collection fails fast without a network call.
    #[inline]
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        if question.trim().is_empty() {
            return Err(TextQaError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let collection = self.session.collection()?;
        let query = embed_question(self.embedder.as_ref(), question)?;
        collection.search(&query, k)
    }

    #[inline]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

/// Context and retrieval budget for answer composition.
#[derive(Debug, Clone)]
pub struct ComposerOptions {
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Context budget for the generation prompt, in characters.
    pub max_context_chars: usize,
}

impl Default for ComposerOptions {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: 3,
            max_context_chars: 8000,
        }
    }
}

/// Turns a question into a grounded answer: retrieve, build the prompt,
/// generate.
pub struct AnswerComposer {
    retriever: Retriever,
    generator: Arc<dyn GenerationClient>,
    options: ComposerOptions,
}

impl AnswerComposer {
    #[inline]
    pub fn new(
        retriever: Retriever,
        generator: Arc<dyn GenerationClient>,
        options: ComposerOptions,
    ) -> Self {
        Self {
            retriever,
            generator,
            options,
        }
    }

    /// Answer `question` using the configured retrieval depth.
    #[inline]
    pub fn answer(&self, question: &str) -> Result<AnswerResult> {
        self.answer_with_k(question, self.options.top_k)
    }

    /// Answer `question`, retrieving the top `k` chunks as grounding.
    ///
    /// All retrieved chunks are reported as sources even when the context
    /// budget keeps some of them out of the prompt.
    #[inline]
    pub fn answer_with_k(&self, question: &str, k: usize) -> Result<AnswerResult> {
        let sources = self.retriever.retrieve(question, k)?;
        let context = build_context(&sources, self.options.max_context_chars);
        let prompt = build_prompt(&context, question);

        debug!(
            "Composing answer from {} sources ({} context characters)",
            sources.len(),
            context.chars().count()
        );

        let answer = self.generator.generate(&prompt)?;

        Ok(AnswerResult {
            question: question.to_string(),
            answer,
            sources,
        })
    }
}

/// Join retrieved chunks into prompt context, best first, stopping at the
/// character budget. Chunks are never truncated mid-text and the top-ranked
/// chunk is always included, even when it alone exceeds the budget.
fn build_context(sources: &[SearchResult], max_chars: usize) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(sources.len());
    let mut used = 0;

    for (i, source) in sources.iter().enumerate() {
        let len = source.chunk.text.chars().count();
        if i > 0 && used + len > max_chars {
            debug!("Context budget reached after {} chunks", i);
            break;
        }
        parts.push(&source.chunk.text);
        used += len;
    }

    parts.join("\n\n")
}

fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Use the following pieces of context to answer the question at the end.\n\
         If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer in a clear and concise manner:"
    )
}
