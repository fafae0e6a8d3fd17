// LanceDB vector store
// Persists embedded FAQ documents and answers nearest-neighbour queries


use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::loader::FaqDocument;
use crate::{FaqError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

/// A document with its embedding, as written to the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub document: FaqDocument,
    pub created_at: String,
}

/// A retrieved document and its cosine similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: FaqDocument,
    pub score: f32,
}

/// Description of how an index was built, stored next to the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub embedding_model: String,
    pub dimension: usize,
    pub documents: usize,
    pub source: PathBuf,
    pub table: String,
    pub created_at: DateTime<Utc>,
}

/// Nearest-neighbour search over stored documents
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `limit` documents ordered by descending similarity
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredDocument>>;
}

#[async_trait]
impl<T: VectorIndex + ?Sized> VectorIndex for &T {
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredDocument>> {
        (**self).search(query_vector, limit).await
    }
}

pub struct VectorStore {
    path: PathBuf,
    table: Table,
    manifest: IndexManifest,
}

impl VectorStore {
    /// Build a fresh index at `path`, replacing any table of the same name
    #[inline]
    pub async fn create(
        path: &Path,
        records: &[IndexRecord],
        manifest: IndexManifest,
    ) -> Result<Self> {
        let Some(first) = records.first() else {
            return Err(FaqError::Index(
                "Refusing to build an index with no documents".to_string(),
            ));
        };

        let vector_dim = first.vector.len();
        if vector_dim == 0 {
            return Err(FaqError::Index("Embeddings have zero dimensions".to_string()));
        }
        if let Some(bad) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(FaqError::Index(format!(
                "Embedding for row {} has {} dimensions, expected {}",
                bad.document.row,
                bad.vector.len(),
                vector_dim
            )));
        }

        fs::create_dir_all(path).map_err(|e| {
            FaqError::Index(format!(
                "Failed to create index directory {}: {}",
                path.display(),
                e
            ))
        })?;

        let manifest_path = path.join(MANIFEST_FILE);
        if manifest_path.exists() {
            fs::remove_file(&manifest_path)?;
        }

        let connection = connect(path).await?;
        drop_table_if_exists(&connection, &manifest.table).await?;

        let schema = create_schema(vector_dim);
        let table = connection
            .create_empty_table(&manifest.table, Arc::clone(&schema))
            .execute()
            .await
            .map_err(|e| FaqError::Index(format!("Failed to create table: {}", e)))?;

        let record_batch = create_record_batch(records, vector_dim, schema)?;
        let batch_schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), batch_schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| FaqError::Index(format!("Failed to insert documents: {}", e)))?;

        let manifest = IndexManifest {
            dimension: vector_dim,
            documents: records.len(),
            ..manifest
        };
        let manifest_json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| FaqError::Index(format!("Failed to serialize manifest: {}", e)))?;
        fs::write(&manifest_path, manifest_json)?;

        info!(
            "Wrote index with {} documents ({} dimensions) to {}",
            records.len(),
            vector_dim,
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            table,
            manifest,
        })
    }

    /// Open an index previously written by [`VectorStore::create`]
    #[inline]
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(FaqError::Index(format!(
                "No index found at {}; build it first",
                path.display()
            )));
        }

        let manifest = read_manifest(path)?;
        let connection = connect(path).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| FaqError::Index(format!("Failed to list tables: {}", e)))?;

        if !table_names.contains(&manifest.table) {
            return Err(FaqError::Index(format!(
                "Index at {} has no '{}' table",
                path.display(),
                manifest.table
            )));
        }

        let table = connection
            .open_table(&manifest.table)
            .execute()
            .await
            .map_err(|e| FaqError::Index(format!("Failed to open table: {}", e)))?;

        debug!(
            "Opened index at {} built with {}",
            path.display(),
            manifest.embedding_model
        );

        Ok(Self {
            path: path.to_path_buf(),
            table,
            manifest,
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Fail unless the index was built with `model`
    #[inline]
    pub fn ensure_embedding_model(&self, model: &str) -> Result<()> {
        if self.manifest.embedding_model == model {
            Ok(())
        } else {
            Err(FaqError::Index(format!(
                "Index was built with embedding model '{}' but '{}' is configured; rebuild the index",
                self.manifest.embedding_model, model
            )))
        }
    }

    /// Number of stored documents
    #[inline]
    pub async fn count(&self) -> Result<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| FaqError::Index(format!("Failed to count rows: {}", e)))
    }
}

#[async_trait]
impl VectorIndex for VectorStore {
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredDocument>> {
        if query_vector.len() != self.manifest.dimension {
            return Err(FaqError::Index(format!(
                "Query vector has {} dimensions but the index has {}",
                query_vector.len(),
                self.manifest.dimension
            )));
        }

        debug!("Searching for similar vectors with limit: {}", limit);

        let mut results = self
            .table
            .vector_search(query_vector)
            .map_err(|e| FaqError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| FaqError::Index(format!("Failed to execute search: {}", e)))?;

        let mut documents = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| FaqError::Index(format!("Failed to read result stream: {}", e)))?
        {
            documents.extend(parse_search_batch(&batch)?);
        }

        documents.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!("Search returned {} documents", documents.len());
        Ok(documents)
    }
}

/// Read the manifest of the index at `path`
#[inline]
pub fn read_manifest(path: &Path) -> Result<IndexManifest> {
    let manifest_path = path.join(MANIFEST_FILE);
    let content = fs::read_to_string(&manifest_path).map_err(|e| {
        FaqError::Index(format!(
            "Failed to read index manifest {}: {}",
            manifest_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        FaqError::Index(format!(
            "Corrupt index manifest {}: {}",
            manifest_path.display(),
            e
        ))
    })
}

async fn connect(path: &Path) -> Result<Connection> {
    let uri = path.to_string_lossy();
    debug!("Connecting to LanceDB at {}", uri);

    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| FaqError::Index(format!("Failed to connect to LanceDB: {}", e)))
}

async fn drop_table_if_exists(connection: &Connection, table_name: &str) -> Result<()> {
    let table_names = connection
        .table_names()
        .execute()
        .await
        .map_err(|e| FaqError::Index(format!("Failed to list tables for drop: {}", e)))?;

    if table_names.iter().any(|name| name == table_name) {
        warn!("Replacing existing '{}' table", table_name);
        connection
            .drop_table(table_name)
            .await
            .map_err(|e| FaqError::Index(format!("Failed to drop table: {}", e)))?;
    }

    Ok(())
}

fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                vector_dim as i32,
            ),
            false,
        ),
        Field::new("source", DataType::Utf8, false),
        Field::new("row", DataType::UInt32, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn create_record_batch(
    records: &[IndexRecord],
    vector_dim: usize,
    schema: Arc<Schema>,
) -> Result<RecordBatch> {
    let len = records.len();

    let mut ids = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * vector_dim);
    let mut sources = Vec::with_capacity(len);
    let mut rows = Vec::with_capacity(len);
    let mut contents = Vec::with_capacity(len);
    let mut created_ats = Vec::with_capacity(len);

    for record in records {
        ids.push(record.id.as_str());
        flat_values.extend_from_slice(&record.vector);
        sources.push(record.document.source.as_str());
        rows.push(u32::try_from(record.document.row).map_err(|_| {
            FaqError::Index(format!("Row number {} is too large", record.document.row))
        })?);
        contents.push(record.document.content.as_str());
        created_ats.push(record.created_at.as_str());
    }

    let field = Arc::new(Field::new("item", DataType::Float32, true));
    let vector_array = FixedSizeListArray::try_new(
        field,
        vector_dim as i32,
        Arc::new(Float32Array::from(flat_values)),
        None,
    )
    .map_err(|e| FaqError::Index(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(sources)),
        Arc::new(UInt32Array::from(rows)),
        Arc::new(StringArray::from(contents)),
        Arc::new(StringArray::from(created_ats)),
    ];

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| FaqError::Index(format!("Failed to create record batch: {}", e)))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| FaqError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| FaqError::Index(format!("Invalid {} column type", name)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<ScoredDocument>> {
    let sources = string_column(batch, "source")?;
    let contents = string_column(batch, "content")?;
    let rows = batch
        .column_by_name("row")
        .ok_or_else(|| FaqError::Index("Missing row column".to_string()))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| FaqError::Index("Invalid row column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut documents = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let distance = distances.map_or(1.0, |d| if d.is_null(row) { 1.0 } else { d.value(row) });

        documents.push(ScoredDocument {
            document: FaqDocument {
                content: contents.value(row).to_string(),
                source: sources.value(row).to_string(),
                row: rows.value(row) as usize,
            },
            // cosine distance is 1 - cosine similarity
            score: 1.0 - distance,
        });
    }

    Ok(documents)
}
