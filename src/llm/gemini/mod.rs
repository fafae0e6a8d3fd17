#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::LanguageModel;
use crate::config::{Credentials, LlmConfig};
use crate::http::{build_agent, request_with_retry};

/// Client for the Google Generative Language `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: Url,
    model: String,
    temperature: f32,
    credentials: Credentials,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    #[inline]
    pub fn new(config: &LlmConfig, credentials: Credentials) -> Result<Self> {
        let mut base_url = config
            .base_url()
            .context("Failed to parse language model base URL")?;
        // keep any gateway prefix when joining the relative endpoint path
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            credentials,
            agent: build_agent(Duration::from_secs(config.timeout_seconds)),
            retry_attempts: config.retry_attempts,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> Result<Url> {
        self.base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .context("Failed to build generateContent URL")
    }
}

impl LanguageModel for GeminiClient {
    #[inline]
    fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint()?;
        debug!(
            "Sending prompt ({} chars) to model {}",
            prompt.len(),
            self.model
        );

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generate request")?;

        let response_text = request_with_retry(url.as_str(), self.retry_attempts, || {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .header("x-goog-api-key", self.credentials.api_key())
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Failed to call language model")?;

        let response: GenerateResponse = serde_json::from_str(&response_text)
            .context("Failed to parse language model response")?;

        extract_text(response)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "unspecified".to_string());
        warn!("Language model returned no candidates (block reason: {})", reason);
        return Err(anyhow::anyhow!(
            "Language model returned no candidates (block reason: {})",
            reason
        ));
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "Language model returned an empty answer (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unspecified")
        ));
    }

    Ok(text.trim().to_string())
}
