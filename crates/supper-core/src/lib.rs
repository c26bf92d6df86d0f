// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Supper dinner orchestrator.
//!
//! This crate provides the collaborator trait definitions, error types, and
//! common types used throughout the Supper workspace. The chat transport,
//! language model, and key-value store adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{SupperError, with_timeout};
pub use types::{
    AdapterType, ChannelId, DishInfo, DishSuggestion, HealthStatus, InboundEvent, InlineButton,
    InlineKeyboard, MessageRef, PollRef, Sender, UserId, Versioned,
};

// Re-export all collaborator traits at crate root.
pub use traits::{ChatTransport, Clock, KeyValueStore, LlmClient, PluginAdapter, SystemClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_display_round_trip() {
        use std::str::FromStr;

        for variant in [AdapterType::Transport, AdapterType::Llm, AdapterType::Storage] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn collaborator_failures_are_classified() {
        let transport = SupperError::Transport {
            message: "down".into(),
            source: None,
        };
        let provider = SupperError::Provider {
            message: "bad json".into(),
            source: None,
        };
        let timeout = SupperError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        assert!(transport.is_collaborator_failure());
        assert!(provider.is_collaborator_failure());
        assert!(timeout.is_collaborator_failure());

        assert!(!SupperError::not_found("vote", "vote:1:p").is_collaborator_failure());
        assert!(!SupperError::InvalidInput("rating".into()).is_collaborator_failure());
    }

    #[test]
    fn not_found_message_names_entity_and_key() {
        let err = SupperError::not_found("channel", "channel:42");
        assert_eq!(err.to_string(), "channel not found: channel:42");
    }

    #[test]
    fn sender_display_name_prefers_username() {
        let with_username = Sender {
            id: UserId(1),
            username: Some("alice".into()),
            first_name: "Alice".into(),
        };
        let without = Sender {
            id: UserId(2),
            username: Some(String::new()),
            first_name: "Bob".into(),
        };
        assert_eq!(with_username.display_name(), "alice");
        assert_eq!(without.display_name(), "Bob");
    }

    #[test]
    fn dish_info_accepts_alternate_ingredient_key() {
        let info: DishInfo = serde_json::from_str(
            r#"{"name":"Borscht","cuisine":"Russian","ingredients":["beet","cabbage"]}"#,
        )
        .expect("should deserialize");
        assert_eq!(info.ingredients_needed, vec!["beet", "cabbage"]);
        assert!(info.instructions.is_empty());
    }

    #[test]
    fn keyboard_lists_callback_data() {
        let kb = InlineKeyboard::row(vec![
            InlineButton::new("Yes", "update_fridge:d1"),
            InlineButton::new("No", "skip_update_fridge"),
        ]);
        let data: Vec<&str> = kb.callback_data().collect();
        assert_eq!(data, vec!["update_fridge:d1", "skip_update_fridge"]);
    }

    #[tokio::test]
    async fn with_timeout_maps_expiry() {
        let result: Result<(), SupperError> = with_timeout(
            std::time::Duration::from_millis(10),
            async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;
        assert!(matches!(result, Err(SupperError::Timeout { .. })));
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_transport<T: ChatTransport>() {}
        fn _assert_llm<T: LlmClient>() {}
        fn _assert_store<T: KeyValueStore>() {}
        fn _assert_clock<T: Clock>() {}
        _assert_clock::<SystemClock>();
    }
}
