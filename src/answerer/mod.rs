// Question answering chain
// Retrieves context, stuffs it into the prompt and asks the language model


use serde::Serialize;
use tracing::{debug, info};

use crate::embeddings::Embedder;
use crate::llm::LanguageModel;
use crate::prompt::{NOT_FOUND_ANSWER, PromptTemplate, stuff_context};
use crate::retriever::Retriever;
use crate::vector_store::{ScoredDocument, VectorIndex};
use crate::{FaqError, Result};

/// The model's reply together with the documents it was shown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    pub source_documents: Vec<ScoredDocument>,
}

impl Answer {
    /// Whether the model declined to answer from the given context
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.text.trim() == NOT_FOUND_ANSWER
    }
}

pub struct QaChain<E, I, L> {
    retriever: Retriever<E, I>,
    template: PromptTemplate,
    model: L,
}

impl<E: Embedder, I: VectorIndex, L: LanguageModel> QaChain<E, I, L> {
    #[inline]
    pub fn new(retriever: Retriever<E, I>, template: PromptTemplate, model: L) -> Self {
        Self {
            retriever,
            template,
            model,
        }
    }

    /// Answer `question` from the indexed FAQ documents.
    ///
    /// The model is consulted even when no document clears the threshold; the prompt then
    /// carries an empty context and the instructions direct it to the not-found reply.
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let source_documents = self.retriever.retrieve(question).await?;
        if source_documents.is_empty() {
            info!("No FAQ entry is similar enough to the question");
        }

        let context = stuff_context(&source_documents);
        let prompt = self.template.render(&context, question);
        debug!(
            "Rendered prompt with {} context documents",
            source_documents.len()
        );

        let text = self
            .model
            .complete(&prompt)
            .map_err(|e| FaqError::Model(format!("{:#}", e)))?;

        Ok(Answer {
            question: question.to_string(),
            text,
            source_documents,
        })
    }
}
