// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps teloxide updates onto channel-agnostic [`InboundEvent`]s.

use supper_core::{ChannelId, InboundEvent, MessageRef, Sender, UserId};
use teloxide::types::{CallbackQuery, Message, PollAnswer, Update, UpdateKind, User};
use teloxide::types::MaybeAnonymousUser as Voter;
use tracing::debug;

/// Converts a Telegram user into the workflow's sender identity.
pub fn to_sender(user: &User) -> Sender {
    Sender {
        id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

/// Maps an update to a workflow event.
///
/// Bot-authored messages, anonymous ballots and update kinds the workflow
/// does not consume yield `None`.
pub fn to_inbound_event(update: Update) -> Option<InboundEvent> {
    match update.kind {
        UpdateKind::Message(msg) => message_event(&msg),
        UpdateKind::CallbackQuery(query) => callback_event(query),
        UpdateKind::PollAnswer(answer) => poll_answer_event(answer),
        _ => {
            debug!(update_id = update.id.0, "ignoring unsupported update kind");
            None
        }
    }
}

fn message_event(msg: &Message) -> Option<InboundEvent> {
    let from = msg.from.as_ref()?;
    if from.is_bot {
        return None;
    }
    // The largest rendition comes last.
    let photo_file_id = msg
        .photo()
        .and_then(|sizes| sizes.last())
        .map(|p| p.file.id.to_string());
    let text = msg.text().or(msg.caption()).map(str::to_string);
    if text.is_none() && photo_file_id.is_none() {
        return None;
    }
    Some(InboundEvent::Message {
        chat: ChannelId(msg.chat.id.0),
        message: MessageRef(i64::from(msg.id.0)),
        from: to_sender(from),
        text,
        photo_file_id,
    })
}

fn callback_event(query: CallbackQuery) -> Option<InboundEvent> {
    let message = query.regular_message()?;
    Some(InboundEvent::Callback {
        id: query.id.0.clone(),
        chat: ChannelId(message.chat.id.0),
        message: MessageRef(i64::from(message.id.0)),
        message_text: message.text().map(str::to_string),
        from: to_sender(&query.from),
        data: query.data.clone().unwrap_or_default(),
    })
}

fn poll_answer_event(answer: PollAnswer) -> Option<InboundEvent> {
    let Voter::User(user) = answer.voter else {
        debug!(poll_id = %answer.poll_id.0, "ignoring ballot cast on behalf of a chat");
        return None;
    };
    Some(InboundEvent::PollAnswer {
        poll_id: answer.poll_id.0,
        user: to_sender(&user),
        option_ids: answer.option_ids.into_iter().map(u32::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Update {
        serde_json::from_value(json).expect("failed to deserialize update")
    }

    fn group() -> serde_json::Value {
        serde_json::json!({"id": -100200i64, "type": "supergroup", "title": "Dinner"})
    }

    #[test]
    fn poll_answer_maps_to_event() {
        let update = parse(serde_json::json!({
            "update_id": 10,
            "poll_answer": {
                "poll_id": "5001",
                "user": {"id": 7, "is_bot": false, "first_name": "Ann", "username": "ann"},
                "option_ids": [2]
            }
        }));
        match to_inbound_event(update).unwrap() {
            InboundEvent::PollAnswer { poll_id, user, option_ids } => {
                assert_eq!(poll_id, "5001");
                assert_eq!(user.id, UserId(7));
                assert_eq!(option_ids, vec![2]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn callback_carries_chat_and_message() {
        let update = parse(serde_json::json!({
            "update_id": 11,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
                "chat_instance": "ci",
                "message": {
                    "message_id": 99,
                    "date": 1700000000i64,
                    "chat": group(),
                    "text": "Who cooks?"
                },
                "data": "volunteer:5001"
            }
        }));
        match to_inbound_event(update).unwrap() {
            InboundEvent::Callback { id, chat, message, data, message_text, from } => {
                assert_eq!(id, "cb1");
                assert_eq!(chat, ChannelId(-100200));
                assert_eq!(message, MessageRef(99));
                assert_eq!(data, "volunteer:5001");
                assert_eq!(message_text.as_deref(), Some("Who cooks?"));
                assert_eq!(from.display_name(), "Ann");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn photo_uses_largest_size_and_caption() {
        let update = parse(serde_json::json!({
            "update_id": 12,
            "message": {
                "message_id": 5,
                "date": 1700000000i64,
                "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
                "chat": group(),
                "caption": "fridge",
                "photo": [
                    {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 90},
                    {"file_id": "large", "file_unique_id": "l", "width": 1280, "height": 1280}
                ]
            }
        }));
        match to_inbound_event(update).unwrap() {
            InboundEvent::Message { text, photo_file_id, .. } => {
                assert_eq!(text.as_deref(), Some("fridge"));
                assert_eq!(photo_file_id.as_deref(), Some("large"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn bot_messages_are_ignored() {
        let update = parse(serde_json::json!({
            "update_id": 13,
            "message": {
                "message_id": 6,
                "date": 1700000000i64,
                "from": {"id": 1, "is_bot": true, "first_name": "Bot"},
                "chat": group(),
                "text": "hello"
            }
        }));
        assert!(to_inbound_event(update).is_none());
    }

    #[test]
    fn messages_without_text_or_photo_are_ignored() {
        let update = parse(serde_json::json!({
            "update_id": 14,
            "message": {
                "message_id": 7,
                "date": 1700000000i64,
                "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
                "chat": group(),
                "location": {"latitude": 52.52, "longitude": 13.40}
            }
        }));
        assert!(to_inbound_event(update).is_none());
    }
}
