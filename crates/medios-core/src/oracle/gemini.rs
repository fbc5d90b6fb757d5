use super::Oracle;
use crate::config::OracleConfig;
use crate::error::{MediosError, Result, UpstreamError};
use crate::shape::ResponseShape;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Google Gemini `generateContent` client.
pub struct GeminiOracle {
    client: Client,
    api_key: SecretString,
    config: OracleConfig,
    name: String,
}

impl GeminiOracle {
    pub fn new(config: OracleConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or_else(|| {
                MediosError::Config(
                    "Gemini API key is required. Set GEMINI_API_KEY environment variable.".into(),
                )
            })?;

        let client = Client::builder().timeout(config.timeout).build()?;
        let name = format!("gemini:{}", config.model);

        Ok(Self {
            client,
            api_key,
            config,
            name,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(
        &self,
        prompt: &str,
        shape: Option<&ResponseShape>,
    ) -> std::result::Result<String, UpstreamError> {
        let body = GenerateRequest::new(prompt, shape);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.config.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.config.timeout))?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| UpstreamError::MalformedBody(e.to_string()))?;
        parsed.into_text()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// --- Wire format ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<PartOut<'a>>,
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str, shape: Option<&ResponseShape>) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![PartOut { text: prompt }],
            }],
            generation_config: shape.map(|s| GenerationConfig {
                response_mime_type: "application/json",
                response_schema: s.to_schema(),
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Deserialize)]
struct PartIn {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> std::result::Result<String, UpstreamError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(UpstreamError::NoContent(format!("prompt blocked: {}", reason)));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::NoContent("no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "empty text".into());
            return Err(UpstreamError::NoContent(reason));
        }

        Ok(text)
    }
}
