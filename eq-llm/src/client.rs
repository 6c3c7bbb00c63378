use crate::error::{ExtractError, Result};
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;
use crate::prompt::{RosterContext, build_prompt};
use crate::wire;
use chrono::{DateTime, Utc};
use eq_core::ActionProposal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
}

/// Client for the one outbound AI call per review action.
///
/// The response is generative: two calls with identical input may disagree,
/// so callers must validate every field against the roster before acting on
/// the proposal. No retry or backoff here; re-invoking is the retry.
#[derive(Clone)]
pub struct ExtractorClient {
    provider: Provider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ExtractorClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ExtractError::InvalidInput("api key is required".to_string()));
        }
        let model = model.trim();
        if model.is_empty() {
            return Err(ExtractError::InvalidInput("model is required".to_string()));
        }
        let provider = detect_provider(model);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Ok(Self {
            provider,
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Extract a structured action from a free-text message.
    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn extract(
        &self,
        message: &str,
        roster: &RosterContext,
        now: DateTime<Utc>,
    ) -> Result<ActionProposal> {
        if message.trim().is_empty() {
            return Err(ExtractError::InvalidInput("message is empty".to_string()));
        }
        let prompt = build_prompt(message, roster, now);

        let raw = match self.provider {
            Provider::Gemini => {
                GeminiClient::new(self.client.clone(), &self.api_key, &self.model)
                    .generate_json(&prompt)
                    .await?
            }
            Provider::OpenAi => {
                OpenAiClient::new(self.client.clone(), &self.api_key, &self.model)
                    .generate_json(&prompt)
                    .await?
            }
        };

        wire::parse_proposal(&raw)
    }
}

fn detect_provider(model: &str) -> Provider {
    let m = model.to_ascii_lowercase();
    if m.starts_with("gemini-") {
        return Provider::Gemini;
    }
    Provider::OpenAi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_detection_by_model_prefix() {
        assert_eq!(detect_provider("gemini-2.5-flash"), Provider::Gemini);
        assert_eq!(detect_provider("Gemini-1.5-pro"), Provider::Gemini);
        assert_eq!(detect_provider("gpt-4o-mini"), Provider::OpenAi);
        assert_eq!(detect_provider("o4-mini"), Provider::OpenAi);
    }

    #[test]
    fn blank_key_or_model_is_rejected() {
        assert!(matches!(
            ExtractorClient::new("  ", "gemini-2.5-flash"),
            Err(ExtractError::InvalidInput(_))
        ));
        assert!(matches!(
            ExtractorClient::new("key", ""),
            Err(ExtractError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn empty_message_fails_before_any_network_call() {
        let client = ExtractorClient::new("key", "gemini-2.5-flash").expect("client");
        let err = client
            .extract("   ", &RosterContext::default(), Utc::now())
            .await
            .expect_err("empty message must fail");
        assert!(matches!(err, ExtractError::InvalidInput(_)));
    }
}
