// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model for deterministic testing.
//!
//! Each `LlmClient` method pops from its own response queue. An empty
//! queue behaves like a provider outage, except `parse_ingredients`, which
//! falls back to splitting the text on commas.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use supper_core::{
    AdapterType, DishInfo, DishSuggestion, HealthStatus, LlmClient, PluginAdapter, SupperError,
};

/// Arguments of one `suggest_dinner_options()` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRequest {
    pub ingredients: Vec<String>,
    pub cuisines: Vec<String>,
    pub count: usize,
}

type Queue<T> = Arc<Mutex<VecDeque<Result<T, String>>>>;

/// A mock LLM client with pre-configured responses.
pub struct MockLlm {
    suggestions: Queue<Vec<DishSuggestion>>,
    dish_infos: Queue<DishInfo>,
    parsed: Queue<Vec<String>>,
    extracted: Queue<Vec<String>>,
    requests: Arc<Mutex<Vec<SuggestionRequest>>>,
    images: Arc<Mutex<Vec<String>>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            suggestions: Arc::new(Mutex::new(VecDeque::new())),
            dish_infos: Arc::new(Mutex::new(VecDeque::new())),
            parsed: Arc::new(Mutex::new(VecDeque::new())),
            extracted: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            images: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue dish suggestions by name.
    pub async fn push_suggestions(&self, names: &[&str]) {
        let list = names
            .iter()
            .map(|name| DishSuggestion {
                name: (*name).to_string(),
                cuisine: "Home".to_string(),
                description: format!("A simple {name}."),
                ..DishSuggestion::default()
            })
            .collect();
        self.suggestions.lock().await.push_back(Ok(list));
    }

    pub async fn fail_suggestions(&self) {
        self.suggestions
            .lock()
            .await
            .push_back(Err("suggestions unavailable".into()));
    }

    pub async fn push_dish_info(&self, info: DishInfo) {
        self.dish_infos.lock().await.push_back(Ok(info));
    }

    pub async fn fail_dish_info(&self) {
        self.dish_infos
            .lock()
            .await
            .push_back(Err("dish info unavailable".into()));
    }

    pub async fn push_parsed(&self, names: &[&str]) {
        self.parsed
            .lock()
            .await
            .push_back(Ok(names.iter().map(|n| (*n).to_string()).collect()));
    }

    pub async fn fail_parse(&self) {
        self.parsed
            .lock()
            .await
            .push_back(Err("parse unavailable".into()));
    }

    pub async fn push_extracted(&self, names: &[&str]) {
        self.extracted
            .lock()
            .await
            .push_back(Ok(names.iter().map(|n| (*n).to_string()).collect()));
    }

    /// Image references passed to `extract_ingredients_from_image()`.
    pub async fn image_requests(&self) -> Vec<String> {
        self.images.lock().await.clone()
    }

    /// Every `suggest_dinner_options()` call so far.
    pub async fn suggestion_requests(&self) -> Vec<SuggestionRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

async fn pop<T>(queue: &Queue<T>, what: &str) -> Result<T, SupperError> {
    match queue.lock().await.pop_front() {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(SupperError::Provider {
            message,
            source: None,
        }),
        None => Err(SupperError::Provider {
            message: format!("mock llm: no {what} response queued"),
            source: None,
        }),
    }
}

#[async_trait]
impl PluginAdapter for MockLlm {
    fn name(&self) -> &str {
        "mock-llm"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Llm
    }

    async fn health_check(&self) -> Result<HealthStatus, SupperError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SupperError> {
        Ok(())
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn suggest_dinner_options(
        &self,
        ingredients: &[String],
        cuisines: &[String],
        count: usize,
    ) -> Result<Vec<DishSuggestion>, SupperError> {
        self.requests.lock().await.push(SuggestionRequest {
            ingredients: ingredients.to_vec(),
            cuisines: cuisines.to_vec(),
            count,
        });
        pop(&self.suggestions, "suggestion").await
    }

    async fn dish_info(&self, _name: &str, _cuisine: Option<&str>) -> Result<DishInfo, SupperError> {
        pop(&self.dish_infos, "dish info").await
    }

    async fn parse_ingredients(&self, text: &str) -> Result<Vec<String>, SupperError> {
        if let Some(queued) = self.parsed.lock().await.pop_front() {
            return queued.map_err(|message| SupperError::Provider {
                message,
                source: None,
            });
        }
        Ok(text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn extract_ingredients_from_image(
        &self,
        image_url: &str,
    ) -> Result<Vec<String>, SupperError> {
        self.images.lock().await.push(image_url.to_string());
        pop(&self.extracted, "image").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queues_are_consumed_in_order() {
        let llm = MockLlm::new();
        llm.push_suggestions(&["Pasta"]).await;
        llm.fail_suggestions().await;

        let first = llm.suggest_dinner_options(&[], &[], 3).await.unwrap();
        assert_eq!(first[0].name, "Pasta");
        assert!(llm.suggest_dinner_options(&[], &[], 3).await.is_err());
        assert!(llm.suggest_dinner_options(&[], &[], 3).await.is_err());
        assert_eq!(llm.suggestion_requests().await.len(), 3);
    }

    #[tokio::test]
    async fn parse_falls_back_to_commas() {
        let llm = MockLlm::new();
        let parsed = llm.parse_ingredients("eggs, milk ,, bread").await.unwrap();
        assert_eq!(parsed, vec!["eggs", "milk", "bread"]);
    }
}
