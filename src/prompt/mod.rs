// Prompt module
// Fixed answering template and "stuff" context assembly


use itertools::Itertools;
use thiserror::Error;

use crate::vector_store::ScoredDocument;

/// Reply the model is instructed to give when the context does not contain the answer
pub const NOT_FOUND_ANSWER: &str = "I don't know.";

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

pub const DEFAULT_TEMPLATE: &str = r#"Given the following context and a question, generate an answer based on this context only.
In the answer try to provide as much text as possible from "response" section in the source document context without making much changes.
If the answer is not found in the context, kindly state "I don't know." Don't try to make up an answer.

CONTEXT: {context}

QUESTION: {question}"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Prompt text with `{context}` and `{question}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    #[inline]
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    #[inline]
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder(placeholder));
            }
        }
        Ok(Self { template })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill both placeholders in a single pass.
    ///
    /// Placeholder-like text inside `context` or `question` is copied verbatim.
    #[inline]
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut output =
            String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            let (before, candidate) = rest.split_at(start);
            output.push_str(before);

            if let Some(after) = candidate.strip_prefix(CONTEXT_PLACEHOLDER) {
                output.push_str(context);
                rest = after;
            } else if let Some(after) = candidate.strip_prefix(QUESTION_PLACEHOLDER) {
                output.push_str(question);
                rest = after;
            } else {
                output.push('{');
                rest = candidate.get(1..).unwrap_or_default();
            }
        }

        output.push_str(rest);
        output
    }
}

/// Concatenate retrieved documents into one context block, separated by blank lines
#[inline]
pub fn stuff_context(documents: &[ScoredDocument]) -> String {
    documents
        .iter()
        .map(|scored| scored.document.content.as_str())
        .join("\n\n")
}
