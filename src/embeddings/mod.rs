// Embeddings module
// Capability trait for text embedding plus the Ollama implementation

pub mod ollama;

use anyhow::Result;

pub use ollama::OllamaClient;

/// Turns text into fixed-dimension vectors.
///
/// Documents and queries must be embedded by the same implementation and model
/// for their vectors to be comparable.
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts, returning one vector per input in order
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Embedder returned no vector for query"))
    }

    /// Name of the model producing the vectors, recorded in the index manifest
    fn model_name(&self) -> &str;
}

impl<T: Embedder + ?Sized> Embedder for &T {
    #[inline]
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_documents(texts)
    }

    #[inline]
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed_query(text)
    }

    #[inline]
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    #[inline]
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_documents(texts)
    }

    #[inline]
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed_query(text)
    }

    #[inline]
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
