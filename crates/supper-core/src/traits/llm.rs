// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model client trait for dish suggestions and ingredient parsing.

use async_trait::async_trait;

use crate::error::SupperError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DishInfo, DishSuggestion};

/// Best-effort cooking assistant backed by a language model.
///
/// Callers must treat every failure as recoverable and fall back to a
/// static message.
#[async_trait]
pub trait LlmClient: PluginAdapter {
    /// Proposes up to `count` dishes that fit the fridge and cuisines.
    async fn suggest_dinner_options(
        &self,
        ingredients: &[String],
        cuisines: &[String],
        count: usize,
    ) -> Result<Vec<DishSuggestion>, SupperError>;

    /// Looks up ingredients and instructions for a dish.
    async fn dish_info(&self, name: &str, cuisine: Option<&str>) -> Result<DishInfo, SupperError>;

    /// Extracts ingredient names from free-form text.
    async fn parse_ingredients(&self, text: &str) -> Result<Vec<String>, SupperError>;

    /// Extracts ingredient names from a photo of a fridge or pantry.
    ///
    /// `image_url` is anything the vision model accepts, including a
    /// base64 `data:` URL.
    async fn extract_ingredients_from_image(&self, image_url: &str)
        -> Result<Vec<String>, SupperError>;
}
