use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Config;
use crate::embeddings::{EmbedOptions, EmbeddingClient, OllamaClient, embed_chunks};
use crate::generation::OllamaGenerator;
use crate::index::store::StoreManager;
use crate::index::{Chunk, Collection};
use crate::qa::{AnswerComposer, ComposerOptions, Retriever, Session};
use crate::chunker;

/// Embedding client decorator that advances a progress bar as batches
/// complete.
struct ProgressClient {
    inner: OllamaClient,
    bar: ProgressBar,
}

impl EmbeddingClient for ProgressClient {
    fn embed(&self, texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        let vectors = self.inner.embed(texts)?;
        self.bar.inc(vectors.len() as u64);
        Ok(vectors)
    }
}

/// Ingest a text file: chunk it, embed the chunks, and persist the
/// resulting collection as a named store.
#[inline]
pub async fn ingest(
    file: PathBuf,
    store: Option<String>,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
) -> Result<()> {
    let config = Config::load_default()?;

    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read input file: {}", file.display()))?;

    let source_id = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let store_name = match store {
        Some(name) => name,
        None => file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .context("Cannot derive a store name from the file path; pass --store")?,
    };

    let chunk_size = chunk_size.unwrap_or(config.chunking.chunk_size);
    let overlap = overlap.unwrap_or(config.chunking.overlap);

    info!(
        "Ingesting {} into store '{}' (chunk_size: {}, overlap: {})",
        file.display(),
        store_name,
        chunk_size,
        overlap
    );

    let texts = chunker::split(&text, chunk_size, overlap)?;
    let chunks = Chunk::sequence(&source_id, texts);
    println!(
        "Split {} into {} chunks",
        file.display(),
        chunks.len()
    );

    let client = OllamaClient::new(&config.ollama)?;
    let client = tokio::task::spawn_blocking(move || {
        client
            .health_check()
            .context("Ollama is not ready for embedding")
            .map(|()| client)
    })
    .await??;

    let bar = ProgressBar::new(chunks.len() as u64).with_style(
        ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks")
            .expect("style template is valid"),
    );
    let progress_client = Arc::new(ProgressClient {
        inner: client,
        bar: bar.clone(),
    });

    let options = EmbedOptions {
        batch_size: config.ollama.batch_size as usize,
        max_concurrency: config.ollama.max_concurrency as usize,
    };
    let embedded = embed_chunks(progress_client, chunks, &options, None).await?;
    bar.finish_and_clear();

    let collection = Collection::build(&store_name, embedded)?;

    let manager = StoreManager::new(config.stores_dir());
    let manifest_path = manager.save(&collection)?;

    println!(
        "Stored {} chunks ({} dimensions) in store '{}'",
        collection.len(),
        collection.dimension(),
        collection.name()
    );
    println!("Manifest: {}", manifest_path.display());

    Ok(())
}

/// Answer a question against a persisted store.
#[inline]
pub async fn ask(question: String, store: Option<String>, k: Option<usize>) -> Result<()> {
    let config = Config::load_default()?;
    let manager = StoreManager::new(config.stores_dir());

    let store_name = resolve_store_name(&manager, store)?;
    info!("Answering against store '{}'", store_name);

    let collection = manager.load(&store_name)?;
    println!(
        "Loaded store '{}' ({} chunks)",
        collection.name(),
        collection.len()
    );

    let session = Arc::new(Session::new());
    session.activate(Arc::new(collection));

    let embedder = Arc::new(OllamaClient::new(&config.ollama)?);
    let generator = Arc::new(OllamaGenerator::new(&config.ollama)?);
    let options = ComposerOptions {
        top_k: k.unwrap_or(config.answer.top_k),
        max_context_chars: config.answer.max_context_chars,
    };
    let retriever = Retriever::new(session, embedder as _);
    let composer = AnswerComposer::new(retriever, generator as _, options);

    // The HTTP clients are blocking; keep them off the async runtime.
    let result =
        tokio::task::spawn_blocking(move || composer.answer(&question)).await??;

    println!();
    println!("{}", result.answer.trim());
    println!();
    println!("Sources:");
    for source in &result.sources {
        println!(
            "  [{:.3}] {} #{}: {}",
            source.score,
            source.chunk.source_id,
            source.chunk.ordinal,
            source.chunk.preview(config.answer.preview_chars)
        );
    }

    Ok(())
}

/// List all persisted stores.
#[inline]
pub async fn list_stores() -> Result<()> {
    let config = Config::load_default()?;
    let manager = StoreManager::new(config.stores_dir());

    let stores = manager.list()?;
    if stores.is_empty() {
        println!("No stores yet.");
        println!("Use 'textqa ingest <file>' to create one.");
        return Ok(());
    }

    println!("Stores ({} total):", stores.len());
    for store in &stores {
        println!("  {} ({} chunks)", store.name, store.entries);
    }

    Ok(())
}

/// Delete a persisted store.
#[inline]
pub async fn delete_store(store: String) -> Result<()> {
    let config = Config::load_default()?;
    let manager = StoreManager::new(config.stores_dir());

    manager.delete(&store)?;
    println!("Deleted store '{}'", store);

    Ok(())
}

/// Show the active configuration, writing the default file first if none
/// exists yet.
#[inline]
pub async fn show_config() -> Result<()> {
    let config = Config::load_default()?;
    let config_path = config.config_file_path();

    if !config_path.exists() {
        config.save()?;
        println!("Wrote default configuration to {}", config_path.display());
    }

    println!("Configuration file: {}", config_path.display());
    println!("Stores directory:   {}", config.stores_dir().display());
    println!();
    print!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

/// Check connectivity to the Ollama server and availability of both
/// configured models.
#[inline]
pub async fn ping() -> Result<()> {
    let config = Config::load_default()?;
    let client = OllamaClient::new(&config.ollama)?;

    let result = tokio::task::spawn_blocking(move || -> Result<()> {
        client.ping().context("Ollama server is not reachable")?;
        println!("Server is reachable at {}", config.ollama.url()?);

        for model in [&config.ollama.embedding_model, &config.ollama.generation_model] {
            match client.validate_model(model) {
                Ok(()) => println!("Model available: {}", model),
                Err(e) => println!("Model missing:   {} ({})", model, e),
            }
        }
        Ok(())
    })
    .await?;

    result
}

/// Resolve which store to answer against. An explicit name wins; otherwise
/// a sole existing store is used implicitly.
fn resolve_store_name(manager: &StoreManager, store: Option<String>) -> Result<String> {
    if let Some(name) = store {
        return Ok(name);
    }

    let stores = manager.list()?;
    match stores.as_slice() {
        [] => bail!("No stores exist yet. Run 'textqa ingest <file>' first."),
        [only] => Ok(only.name.clone()),
        many => {
            let names: Vec<&str> = many.iter().map(|s| s.name.as_str()).collect();
            bail!(
                "Multiple stores exist; pass --store to pick one of: {}",
                names.join(", ")
            )
        }
    }
}
