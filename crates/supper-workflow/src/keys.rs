// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key layout of the shared key-value namespace.

use supper_core::ChannelId;

pub const CHANNEL_PREFIX: &str = "channel:";
pub const VOTE_PREFIX: &str = "vote:";
pub const POLL_INDEX_PREFIX: &str = "poll_index:";

pub fn channel(channel: ChannelId) -> String {
    format!("{CHANNEL_PREFIX}{channel}")
}

pub fn vote(channel: ChannelId, poll_id: &str) -> String {
    format!("{VOTE_PREFIX}{channel}:{poll_id}")
}

pub fn channel_votes(channel: ChannelId) -> String {
    format!("{VOTE_PREFIX}{channel}:")
}

pub fn poll_index(poll_id: &str) -> String {
    format!("{POLL_INDEX_PREFIX}{poll_id}")
}

/// Dinner keys double as dinner identifiers.
pub fn dinner(channel: ChannelId, started_at_millis: i64) -> String {
    format!("dinner:{channel}:{started_at_millis}")
}

pub fn channel_dinners(channel: ChannelId) -> String {
    format!("dinner:{channel}:")
}

pub fn fridge(channel: ChannelId) -> String {
    format!("fridge:{channel}")
}

pub fn suggestion(channel: ChannelId, millis: i64) -> String {
    format!("suggestion:{channel}:{millis}")
}

pub fn channel_suggestions(channel: ChannelId) -> String {
    format!("suggestion:{channel}:")
}

/// Parses `channel:{id}`.
pub fn parse_channel(key: &str) -> Option<ChannelId> {
    key.strip_prefix(CHANNEL_PREFIX)?.parse().ok().map(ChannelId)
}

/// Parses `vote:{channel}:{poll_id}`.
pub fn parse_vote(key: &str) -> Option<(ChannelId, &str)> {
    let (channel, poll_id) = key.strip_prefix(VOTE_PREFIX)?.split_once(':')?;
    let channel = channel.parse().ok().map(ChannelId)?;
    (!poll_id.is_empty()).then_some((channel, poll_id))
}

/// Channel that owns a `dinner:{channel}:{millis}` identifier.
pub fn dinner_channel(dinner_id: &str) -> Option<ChannelId> {
    let (channel, _) = dinner_id.strip_prefix("dinner:")?.split_once(':')?;
    channel.parse().ok().map(ChannelId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_group_ids_round_trip() {
        let ch = ChannelId(-1001234);
        assert_eq!(parse_channel(&channel(ch)), Some(ch));
        assert_eq!(parse_vote(&vote(ch, "5001")), Some((ch, "5001")));
        assert_eq!(dinner_channel(&dinner(ch, 1_700_000_000_000)), Some(ch));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert_eq!(parse_channel("channel:abc"), None);
        assert_eq!(parse_channel("fridge:1"), None);
        assert_eq!(parse_vote("vote:1:"), None);
        assert_eq!(parse_vote("vote:1"), None);
    }
}
