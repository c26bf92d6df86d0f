// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel ingredient inventory.

use std::sync::Arc;

use supper_core::{ChannelId, Clock, SupperError};
use tracing::debug;

use crate::keys;
use crate::models::{Fridge, Ingredient};
use crate::repo::Repository;

#[derive(Clone)]
pub struct FridgeService {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl FridgeService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// The channel's fridge; an empty one if nothing was ever stored.
    pub async fn get(&self, channel: ChannelId) -> Result<Fridge, SupperError> {
        Ok(self
            .repo
            .get(&keys::fridge(channel))
            .await?
            .unwrap_or_else(|| Fridge::empty(channel, self.clock.now())))
    }

    /// Ingredients sorted by name.
    pub async fn list(&self, channel: ChannelId) -> Result<Vec<Ingredient>, SupperError> {
        let mut items: Vec<Ingredient> = self.get(channel).await?.ingredients.into_values().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    /// Adds ingredients by name, replacing same-named entries. Returns what was added.
    pub async fn add(&self, channel: ChannelId, names: &[String]) -> Result<Vec<String>, SupperError> {
        let names: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(names);
        }
        let now = self.clock.now();
        self.repo
            .upsert(
                &keys::fridge(channel),
                || Fridge::empty(channel, now),
                |fridge: &mut Fridge| {
                    for name in &names {
                        fridge.ingredients.insert(
                            name.to_lowercase(),
                            Ingredient {
                                name: name.clone(),
                                quantity: None,
                                added_at: now,
                            },
                        );
                    }
                    fridge.last_updated = now;
                    Ok(())
                },
            )
            .await?;
        debug!(channel = %channel, count = names.len(), "ingredients added");
        Ok(names)
    }

    /// Empties the fridge.
    pub async fn reset(&self, channel: ChannelId) -> Result<(), SupperError> {
        self.repo
            .put(&keys::fridge(channel), &Fridge::empty(channel, self.clock.now()))
            .await?;
        Ok(())
    }

    /// Removes every entry matched by one of `used` (see [`compare_ingredients`]).
    ///
    /// Returns the removed entries' names.
    pub async fn remove_used(
        &self,
        channel: ChannelId,
        used: &[String],
    ) -> Result<Vec<String>, SupperError> {
        let now = self.clock.now();
        let used: Vec<String> = used.iter().map(|u| normalize(u)).filter(|u| !u.is_empty()).collect();
        let removed = self
            .repo
            .upsert(
                &keys::fridge(channel),
                || Fridge::empty(channel, now),
                |fridge: &mut Fridge| {
                    let mut removed = Vec::new();
                    fridge.ingredients.retain(|_, item| {
                        let have = normalize(&item.name);
                        let hit = used.iter().any(|u| matches(&have, u));
                        if hit {
                            removed.push(item.name.clone());
                        }
                        !hit
                    });
                    fridge.last_updated = now;
                    Ok(removed)
                },
            )
            .await?;
        debug!(channel = %channel, removed = removed.len(), "used ingredients removed");
        Ok(removed)
    }
}

/// Needed ingredients with no fuzzy match among `available`.
///
/// Names are compared lowercased, trimmed and cut at the first `(`; one name
/// containing the other counts as a match ("egg" matches "eggs").
pub fn compare_ingredients(needed: &[String], available: &[String]) -> Vec<String> {
    let available: Vec<String> = available.iter().map(|a| normalize(a)).collect();
    needed
        .iter()
        .filter(|item| {
            let wanted = normalize(item);
            !available.iter().any(|have| matches(have, &wanted))
        })
        .cloned()
        .collect()
}

fn normalize(name: &str) -> String {
    let name = match name.find('(') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    name.trim().to_lowercase()
}

fn matches(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use supper_core::SystemClock;
    use supper_storage::MemoryStore;

    fn service() -> FridgeService {
        FridgeService::new(
            Repository::new(Arc::new(MemoryStore::new())),
            Arc::new(SystemClock),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compare_is_fuzzy_and_ignores_quantities() {
        let missing = compare_ingredients(
            &strings(&["Eggs (3)", "milk", "saffron"]),
            &strings(&["egg", "Whole Milk"]),
        );
        assert_eq!(missing, vec!["saffron"]);
    }

    #[tokio::test]
    async fn add_list_and_reset() {
        let fridge = service();
        let ch = ChannelId(5);
        assert!(fridge.list(ch).await.unwrap().is_empty());

        let added = fridge
            .add(ch, &strings(&[" tomato ", "", "Basil"]))
            .await
            .unwrap();
        assert_eq!(added, vec!["tomato", "Basil"]);

        let names: Vec<String> = fridge.list(ch).await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Basil", "tomato"]);

        fridge.reset(ch).await.unwrap();
        assert!(fridge.list(ch).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_used_matches_loosely() {
        let fridge = service();
        let ch = ChannelId(6);
        fridge
            .add(ch, &strings(&["beets", "cabbage", "sour cream"]))
            .await
            .unwrap();
        let removed = fridge
            .remove_used(ch, &strings(&["beet (2)", "Cabbage"]))
            .await
            .unwrap();
        assert_eq!(removed.len(), 2);
        let left: Vec<String> = fridge.list(ch).await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(left, vec!["sour cream"]);
    }
}
