// Indexer module
// Loads the FAQ source, embeds every document and writes the vector index


use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{Config, SourceConfig};
use crate::embeddings::Embedder;
use crate::loader::FaqLoader;
use crate::vector_store::{IndexManifest, IndexRecord, VectorStore};
use crate::{FaqError, Result};

/// Summary of a completed index build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub skipped_rows: Vec<usize>,
    pub dimension: usize,
    pub index_path: PathBuf,
    pub elapsed: Duration,
}

/// Builds the on-disk index from the configured FAQ source
pub struct Indexer<E> {
    embedder: E,
    source_path: PathBuf,
    source: SourceConfig,
    index_path: PathBuf,
    table: String,
}

impl<E: Embedder> Indexer<E> {
    #[inline]
    pub fn new(embedder: E, config: &Config) -> Self {
        Self {
            embedder,
            source_path: config.source_path(),
            source: config.source.clone(),
            index_path: config.index_path(),
            table: config.index.table.clone(),
        }
    }

    #[inline]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Load, embed and persist every document, replacing any previous index.
    ///
    /// Nothing is embedded if the source cannot be loaded.
    #[inline]
    pub async fn build(&self) -> Result<IndexReport> {
        let started = Instant::now();
        info!("Building index from {}", self.source_path.display());

        let loaded = FaqLoader::new(&self.source_path, &self.source).load()?;
        let texts: Vec<String> = loaded
            .documents
            .iter()
            .map(|doc| doc.content.clone())
            .collect();

        debug!(
            "Embedding {} documents with {}",
            texts.len(),
            self.embedder.model_name()
        );
        let vectors = self
            .embedder
            .embed_documents(&texts)
            .map_err(|e| FaqError::Embedding(format!("{:#}", e)))?;

        if vectors.len() != loaded.documents.len() {
            return Err(FaqError::Embedding(format!(
                "Expected {} embeddings, got {}",
                loaded.documents.len(),
                vectors.len()
            )));
        }

        let created_at = Utc::now();
        let timestamp = created_at.to_rfc3339();
        let records: Vec<IndexRecord> = loaded
            .documents
            .into_iter()
            .zip(vectors)
            .map(|(document, vector)| IndexRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                document,
                created_at: timestamp.clone(),
            })
            .collect();

        let manifest = IndexManifest {
            embedding_model: self.embedder.model_name().to_string(),
            dimension: 0,
            documents: 0,
            source: self.source_path.clone(),
            table: self.table.clone(),
            created_at,
        };

        let store = VectorStore::create(&self.index_path, &records, manifest).await?;

        let report = IndexReport {
            documents: store.manifest().documents,
            skipped_rows: loaded.skipped_rows,
            dimension: store.manifest().dimension,
            index_path: self.index_path.clone(),
            elapsed: started.elapsed(),
        };

        info!(
            "Indexed {} documents in {:.2}s",
            report.documents,
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }
}
