// Language model module
// Capability trait for prompt completion plus the Gemini implementation

pub mod gemini;

use anyhow::Result;

pub use gemini::GeminiClient;

/// Sends a fully rendered prompt to a language model and returns its reply
pub trait LanguageModel: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<T: LanguageModel + ?Sized> LanguageModel for &T {
    #[inline]
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

impl<T: LanguageModel + ?Sized> LanguageModel for Box<T> {
    #[inline]
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}
