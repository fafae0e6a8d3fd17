use super::*;
use crate::loader::FaqDocument;
use async_trait::async_trait;

/// Brute-force cosine search over documents held in memory
struct MemoryIndex {
    entries: Vec<(Vec<f32>, FaqDocument)>,
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredDocument>> {
        let mut scored: Vec<ScoredDocument> = self
            .entries
            .iter()
            .map(|(vector, document)| ScoredDocument {
                document: document.clone(),
                score: cosine(vector, query_vector),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }
}

/// Maps a few known queries to fixed vectors
struct FixedEmbedder;

impl Embedder for FixedEmbedder {
    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| match text.as_str() {
                "javascript" => Ok(vec![1.0, 0.0, 0.0]),
                "between" => Ok(vec![1.0, 1.0, 0.0]),
                "unrelated" => Ok(vec![0.0, 0.0, 1.0]),
                other => Err(anyhow::anyhow!("no vector for {}", other)),
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

fn document(row: usize, source: &str) -> FaqDocument {
    FaqDocument {
        content: format!("prompt: {}", source),
        source: source.to_string(),
        row,
    }
}

fn sample_index() -> MemoryIndex {
    MemoryIndex {
        entries: vec![
            (vec![1.0, 0.0, 0.0], document(0, "javascript course")),
            (vec![0.9, 0.1, 0.0], document(1, "javascript bootcamp")),
            (vec![0.0, 1.0, 0.0], document(2, "python course")),
            (vec![0.6, 0.4, 0.0], document(3, "web development")),
        ],
    }
}

fn config(top_k: usize, score_threshold: f32) -> RetrievalConfig {
    RetrievalConfig {
        top_k,
        score_threshold,
    }
}

#[tokio::test]
async fn keeps_documents_above_threshold() {
    let retriever = Retriever::new(FixedEmbedder, sample_index(), &config(4, 0.7));

    let results = retriever
        .retrieve("javascript")
        .await
        .expect("retrieval should succeed");

    let sources: Vec<&str> = results.iter().map(|r| r.document.source.as_str()).collect();
    assert_eq!(
        sources,
        vec!["javascript course", "javascript bootcamp", "web development"]
    );
    assert!(results.iter().all(|r| r.score >= 0.7));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn top_k_limits_results() {
    let retriever = Retriever::new(FixedEmbedder, sample_index(), &config(1, 0.0));

    let results = retriever.retrieve("between").await.expect("retrieval");

    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn unrelated_query_returns_nothing() {
    let retriever = Retriever::new(FixedEmbedder, sample_index(), &config(4, 0.7));

    let results = retriever.retrieve("unrelated").await.expect("retrieval");

    assert!(results.is_empty());
}

#[tokio::test]
async fn threshold_of_one_requires_exact_direction() {
    let retriever = Retriever::new(FixedEmbedder, sample_index(), &config(4, 0.999));

    let results = retriever.retrieve("javascript").await.expect("retrieval");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.row, 0);
    assert_eq!(retriever.score_threshold(), 0.999);
}

#[tokio::test]
async fn embedding_failure_is_reported() {
    let retriever = Retriever::new(FixedEmbedder, sample_index(), &config(4, 0.7));

    let result = retriever.retrieve("anything else").await;

    assert!(matches!(result, Err(FaqError::Embedding(_))));
}
