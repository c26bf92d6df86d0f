// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible language model adapter for Supper.
//!
//! This crate implements [`LlmClient`] on top of the Chat Completions API:
//! dinner suggestions, dish lookups, and ingredient extraction from text
//! and photos.

pub mod client;
pub mod prompts;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use supper_config::model::OpenAiConfig;
use supper_core::{
    AdapterType, DishInfo, DishSuggestion, HealthStatus, LlmClient, PluginAdapter, SupperError,
};
use tracing::{debug, info, warn};

use crate::client::ChatClient;
use crate::prompts::{clean_json_response, extract_ingredients_from_text, preview};
use crate::types::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent};

/// Language model adapter implementing [`LlmClient`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiLlm {
    client: ChatClient,
}

impl OpenAiLlm {
    /// Creates the adapter from the `[openai]` config section.
    pub fn new(config: &OpenAiConfig) -> Result<Self, SupperError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = ChatClient::new(
            &api_key,
            &config.api_base,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(model = %config.model, api_base = %config.api_base, "OpenAI client initialized");
        Ok(Self { client })
    }

    /// Sends one completion and returns the fence-stripped text.
    async fn ask(&self, messages: Vec<ChatMessage>, temperature: f32) -> Result<String, SupperError> {
        let request = ChatRequest {
            model: self.client.model().to_string(),
            messages,
            temperature,
        };
        let response = self.client.complete(&request).await?;
        let text = response.first_text().ok_or_else(|| SupperError::Provider {
            message: "no response from OpenAI API".into(),
            source: None,
        })?;
        debug!(response = %preview(text, 100), "completion text");
        Ok(clean_json_response(text).to_string())
    }

    async fn ask_json<T: DeserializeOwned>(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> Result<T, SupperError> {
        let text = self.ask(messages, temperature).await?;
        parse_json(&text)
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, SupperError> {
    serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, content = %preview(text, 200), "unparseable completion");
        SupperError::Provider {
            message: format!("failed to parse OpenAI response: {e}"),
            source: Some(Box::new(e)),
        }
    })
}

#[async_trait]
impl PluginAdapter for OpenAiLlm {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Llm
    }

    async fn health_check(&self) -> Result<HealthStatus, SupperError> {
        // No API call: health checks should not spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SupperError> {
        debug!("OpenAI client shutting down");
        Ok(())
    }
}

#[async_trait]
impl LlmClient for OpenAiLlm {
    async fn suggest_dinner_options(
        &self,
        ingredients: &[String],
        cuisines: &[String],
        count: usize,
    ) -> Result<Vec<DishSuggestion>, SupperError> {
        info!(
            ingredients = ingredients.len(),
            cuisines = cuisines.len(),
            count,
            "requesting dinner suggestions"
        );
        let messages = vec![
            ChatMessage::system(prompts::SUGGEST_SYSTEM),
            ChatMessage::user(prompts::suggest_prompt(ingredients, cuisines, count)),
        ];
        let suggestions: Vec<DishSuggestion> = self.ask_json(messages, 0.7).await?;
        Ok(suggestions
            .into_iter()
            .filter(|s| !s.name.trim().is_empty())
            .collect())
    }

    async fn dish_info(&self, name: &str, cuisine: Option<&str>) -> Result<DishInfo, SupperError> {
        info!(dish = %name, cuisine = ?cuisine, "requesting dish info");
        let messages = vec![
            ChatMessage::system(prompts::DISH_INFO_SYSTEM),
            ChatMessage::user(prompts::dish_info_prompt(name, cuisine)),
        ];
        let mut info: DishInfo = self.ask_json(messages, 0.3).await?;
        if info.name.trim().is_empty() {
            info.name = name.to_string();
        }
        Ok(info)
    }

    async fn parse_ingredients(&self, text: &str) -> Result<Vec<String>, SupperError> {
        debug!(text = %preview(text, 100), "parsing ingredients from text");
        let messages = vec![ChatMessage::user(prompts::parse_ingredients_prompt(text))];
        self.ask_json(messages, 0.2).await
    }

    async fn extract_ingredients_from_image(
        &self,
        image_url: &str,
    ) -> Result<Vec<String>, SupperError> {
        info!("extracting ingredients from photo");
        let messages = vec![
            ChatMessage::system(prompts::IMAGE_SYSTEM),
            ChatMessage {
                role: "user".into(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: prompts::IMAGE_QUESTION.into(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_url.to_string(),
                        },
                    },
                ]),
            },
        ];
        let text = self.ask(messages, 0.2).await?;
        match parse_json::<Vec<String>>(&text) {
            Ok(list) => Ok(list),
            Err(err) => {
                let fallback = extract_ingredients_from_text(&text);
                if fallback.is_empty() {
                    return Err(err);
                }
                info!(count = fallback.len(), "extracted ingredients with lenient parser");
                Ok(fallback)
            }
        }
    }
}

/// Resolves the API key: config value first, then the `OPENAI_API_KEY` env var.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, SupperError> {
    if let Some(key) = config_key.as_deref().filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    std::env::var("OPENAI_API_KEY").map_err(|_| {
        SupperError::Config(
            "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn llm(server: &MockServer) -> OpenAiLlm {
        OpenAiLlm::new(&OpenAiConfig {
            api_key: Some("sk-test".into()),
            api_base: server.uri(),
            model: "gpt-3.5-turbo".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
        }))
    }

    #[tokio::test]
    async fn suggestions_parse_fenced_array() {
        let server = MockServer::start().await;
        let content = "```json\n[{\"name\":\"Carbonara\",\"cuisine\":\"Italian\",\"description\":\"Pasta\",\"ingredients_needed\":[\"eggs\",\"pasta\"],\"ingredients_missing\":[\"guanciale\"]},{\"name\":\"\"}]\n```";
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"temperature": 0.7})))
            .respond_with(reply(content))
            .mount(&server)
            .await;

        let out = llm(&server)
            .suggest_dinner_options(&["eggs".into()], &["Italian".into()], 2)
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Carbonara");
        assert_eq!(out[0].ingredients_missing, vec!["guanciale"]);
    }

    #[tokio::test]
    async fn dish_info_accepts_ingredients_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(reply(
                r#"{"cuisine":"Russian","ingredients":["beet"],"instructions":["boil"],"description":"soup"}"#,
            ))
            .mount(&server)
            .await;

        let info = llm(&server).dish_info("Borscht", None).await.unwrap();
        assert_eq!(info.name, "Borscht");
        assert_eq!(info.ingredients_needed, vec!["beet"]);
        assert_eq!(info.instructions, vec!["boil"]);
    }

    #[tokio::test]
    async fn parse_ingredients_rejects_prose() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(reply("I found eggs and milk"))
            .mount(&server)
            .await;

        let err = llm(&server).parse_ingredients("eggs, milk").await.unwrap_err();
        assert!(matches!(err, SupperError::Provider { .. }));
    }

    #[tokio::test]
    async fn image_extraction_falls_back_to_lenient_parse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(reply("[\"eggs\", \"milk\",]"))
            .mount(&server)
            .await;

        let out = llm(&server)
            .extract_ingredients_from_image("https://example.com/fridge.jpg")
            .await
            .unwrap();
        assert_eq!(out, vec!["eggs", "milk"]);
    }

    #[tokio::test]
    async fn empty_choices_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "x", "choices": []})),
            )
            .mount(&server)
            .await;

        let err = llm(&server).parse_ingredients("eggs").await.unwrap_err();
        assert!(err.to_string().contains("no response"), "got: {err}");
    }

    #[test]
    fn resolve_api_key_prefers_config() {
        assert_eq!(resolve_api_key(&Some("sk-1".into())).unwrap(), "sk-1");
    }
}
