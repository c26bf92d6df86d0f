// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction and lenient parsing of model output.

pub(crate) const DISH_INFO_SYSTEM: &str =
    "You are a cooking expert who provides accurate information about dishes and recipes.";

pub(crate) const SUGGEST_SYSTEM: &str = "You are a cooking expert who helps families decide what to cook for dinner based on available ingredients.";

pub(crate) const IMAGE_SYSTEM: &str = "You are a computer vision expert. Look at the image of a fridge or pantry and list all visible food ingredients.
Be thorough and try to identify as many food items as possible.
Return only a JSON array of ingredient names, no other text.
For example: [\"eggs\", \"milk\", \"tomatoes\", \"chicken breast\"]";

pub(crate) const IMAGE_QUESTION: &str =
    "What food ingredients do you see in this image? List all of them in a JSON array.";

const DISH_JSON_SHAPE: &str = r#"Return the information in the following JSON format:
{
  "name": "Full dish name",
  "cuisine": "Cuisine type",
  "ingredients_needed": ["ingredient1", "ingredient2", ...],
  "instructions": ["step1", "step2", ...],
  "description": "Brief description of the dish"
}
Only return the JSON, no other text."#;

pub(crate) fn dish_info_prompt(name: &str, cuisine: Option<&str>) -> String {
    match cuisine.filter(|c| !c.trim().is_empty()) {
        Some(cuisine) => format!(
            "You are a cooking expert. Please provide detailed information about the dish \"{name}\" from {cuisine} cuisine.\n{DISH_JSON_SHAPE}"
        ),
        None => format!(
            "You are a cooking expert. Please provide detailed information about the dish \"{name}\".\nDetermine the most likely cuisine for this dish.\n{DISH_JSON_SHAPE}"
        ),
    }
}

pub(crate) fn suggest_prompt(ingredients: &[String], cuisines: &[String], count: usize) -> String {
    format!(
        r#"You are a cooking expert. Based on the available ingredients and preferred cuisines, suggest {count} dinner options.

Available ingredients: {}

Preferred cuisines: {}

Return the suggestions in the following JSON format:
[
  {{
    "name": "Dish name",
    "cuisine": "Cuisine type",
    "description": "Brief description of the dish",
    "ingredients_needed": ["ingredient1", "ingredient2", ...],
    "ingredients_missing": ["ingredient1", "ingredient2", ...]
  }},
  ...
]

Only return the JSON array, no other text."#,
        ingredients.join(", "),
        cuisines.join(", "),
    )
}

pub(crate) fn parse_ingredients_prompt(text: &str) -> String {
    format!(
        "You are a cooking assistant. Extract all food ingredients from the following text.
Return only a JSON array of ingredient names, no other text.
For example: [\"eggs\", \"milk\", \"tomatoes\", \"chicken breast\"]

Text: {text}"
    )
}

/// Strips a surrounding markdown code fence (```json ... ```), if present.
pub fn clean_json_response(raw: &str) -> &str {
    let s = raw.trim();
    if !s.starts_with("```") {
        return s;
    }
    let body = s.split_once('\n').map_or("", |(_, rest)| rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Best-effort ingredient list from output that is not valid JSON.
///
/// Splits on list punctuation and drops fragments that look like JSON syntax.
pub fn extract_ingredients_from_text(s: &str) -> Vec<String> {
    s.split([',', '\n', '"', '[', ']', '\t'])
        .map(str::trim)
        .filter(|w| w.chars().count() > 1)
        .filter(|w| !matches!(*w, "null" | "true" | "false"))
        .filter(|w| !w.starts_with(|c: char| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

/// Truncates `s` to at most `max` characters for log output.
pub(crate) fn preview(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
