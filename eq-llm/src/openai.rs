use crate::error::{ExtractError, Result};
use crate::wire;
use serde::{Deserialize, Serialize};

const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone)]
pub(crate) struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub(crate) fn new(http: reqwest::Client, api_key: &str, model: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// One chat completion with a strict JSON-schema response format.
    /// Returns the raw JSON text of the first choice.
    #[tracing::instrument(level = "info", skip_all)]
    pub(crate) async fn generate_json(&self, prompt: &str) -> Result<String> {
        let req = OpenAiChatRequest {
            model: self.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            response_format: serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "stable_message_action",
                    "strict": true,
                    "schema": wire::openai_response_schema(),
                }
            }),
        };

        let response = self
            .http
            .post(OPENAI_CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExtractError::Http(format!(
                "openai chat status={status} body={body}"
            )));
        }

        let parsed: OpenAiChatResponse = serde_json::from_str(&body)?;
        parsed.first_text()
    }
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatResponse {
    fn first_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ExtractError::ResponseFormat("openai response missing choices".to_string())
            })
    }
}
