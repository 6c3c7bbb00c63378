use crate::error::{ExtractError, Result};
use crate::wire;
use serde::{Deserialize, Serialize};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone)]
pub(crate) struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub(crate) fn new(http: reqwest::Client, api_key: &str, model: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// One `generateContent` call constrained to the declared JSON schema.
    /// Returns the raw JSON text of the first candidate.
    #[tracing::instrument(level = "info", skip_all)]
    pub(crate) async fn generate_json(&self, prompt: &str) -> Result<String> {
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: wire::gemini_response_schema(),
            },
        };

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExtractError::Http(format!(
                "gemini generateContent status={status} body={body}"
            )));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)?;
        parsed.first_text()
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    fn first_text(self) -> Result<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ExtractError::ResponseFormat("gemini response has no candidate text".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_text_extracts_the_candidate_body() {
        let parsed: GeminiResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    { "content": { "parts": [ { "text": "{\"actionType\":\"QUERY\",\"details\":\"x\"}" } ] } }
                ]
            }"#,
        )
        .expect("parse response");
        let text = parsed.first_text().expect("candidate text");
        assert!(text.contains("QUERY"));
    }

    #[test]
    fn empty_candidates_are_a_format_error() {
        let parsed: GeminiResponse =
            serde_json::from_str(r#"{"candidates": []}"#).expect("parse response");
        let err = parsed.first_text().expect_err("must fail");
        assert!(matches!(err, ExtractError::ResponseFormat(_)));
    }
}
