//! Channel state and the typed mutations that change it.
//!
//! A [`ChannelState`] is everything the game remembers about one guild.
//! Changes are expressed as [`Mutation`]s so that the same list can be
//! folded into the in-memory value and written to a store in one batch.

use crate::member::MemberRecord;
use crate::settings::{SettingKey, Settings, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the count time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Unix timestamp in milliseconds.
    pub time: i64,
    /// Count at that time.
    pub count: i64,
}

/// Game state of one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelState {
    /// Counting channel; `None` means the game is not enabled.
    pub channel_id: Option<String>,
    /// Last accepted value.
    pub count: i64,
    /// Author of the last accepted post.
    #[serde(alias = "previousUserId")]
    pub previous_poster_id: Option<String>,
    /// The last accepted post (or its repost).
    pub previous_message_id: Option<String>,
    /// Member counters keyed by member id.
    #[serde(alias = "users")]
    pub members: BTreeMap<String, MemberRecord>,
    /// Append-only snapshots of the count.
    pub history: Vec<HistoryPoint>,
    /// Game rules.
    pub settings: Settings,
}

/// A single typed change to a [`ChannelState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Enable (Some) or clear the counting channel.
    SetChannel(Option<String>),
    /// Overwrite the count.
    SetCount(i64),
    /// Force the count to zero.
    ResetCount,
    /// Overwrite the last accepted poster.
    SetPreviousPoster(Option<String>),
    /// Overwrite the last accepted message.
    SetPreviousMessage(Option<String>),
    /// Change one boolean setting.
    SetSetting(SettingKey, bool),
    /// Change leaderboard visibility.
    SetVisibility(Visibility),
    /// Add one accepted post to a member.
    IncrementCounts(String),
    /// Add one rejected post to a member.
    IncrementFails(String),
    /// Append a history snapshot.
    PushHistory(HistoryPoint),
}

impl Mutation {
    /// Static label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetChannel(_) => "set_channel",
            Self::SetCount(_) => "set_count",
            Self::ResetCount => "reset_count",
            Self::SetPreviousPoster(_) => "set_previous_poster",
            Self::SetPreviousMessage(_) => "set_previous_message",
            Self::SetSetting(..) => "set_setting",
            Self::SetVisibility(_) => "set_visibility",
            Self::IncrementCounts(_) => "increment_counts",
            Self::IncrementFails(_) => "increment_fails",
            Self::PushHistory(_) => "push_history",
        }
    }
}

impl ChannelState {
    /// Fresh state with the game enabled in `channel_id`.
    pub fn enabled(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: Some(channel_id.into()),
            ..Self::default()
        }
    }

    /// Whether the game is enabled.
    pub fn is_enabled(&self) -> bool {
        self.channel_id.is_some()
    }

    /// Whether `channel_id` is this guild's counting channel.
    pub fn is_counting_channel(&self, channel_id: &str) -> bool {
        self.channel_id.as_deref() == Some(channel_id)
    }

    /// The value the next accepted post must carry.
    ///
    /// `None` once the count reaches `i64::MAX`; no post can be accepted
    /// after that.
    pub fn next_count(&self) -> Option<i64> {
        self.count.checked_add(1)
    }

    /// Counters for `member_id`, zero if the member never posted.
    pub fn member(&self, member_id: &str) -> MemberRecord {
        self.members.get(member_id).copied().unwrap_or_default()
    }

    fn member_mut(&mut self, member_id: &str) -> &mut MemberRecord {
        self.members.entry(member_id.to_string()).or_default()
    }

    /// Apply one mutation in place.
    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::SetChannel(channel) => self.channel_id = channel.clone(),
            Mutation::SetCount(count) => self.count = (*count).max(0),
            Mutation::ResetCount => self.count = 0,
            Mutation::SetPreviousPoster(poster) => self.previous_poster_id = poster.clone(),
            Mutation::SetPreviousMessage(message) => self.previous_message_id = message.clone(),
            Mutation::SetSetting(key, value) => self.settings.set(*key, *value),
            Mutation::SetVisibility(visibility) => self.settings.visibility = *visibility,
            Mutation::IncrementCounts(member) => self.member_mut(member).increment_counts(),
            Mutation::IncrementFails(member) => self.member_mut(member).increment_fails(),
            Mutation::PushHistory(point) => self.history.push(*point),
        }
    }

    /// Apply a batch of mutations in order.
    pub fn apply_all<'a>(&mut self, mutations: impl IntoIterator<Item = &'a Mutation>) {
        for mutation in mutations {
            self.apply(mutation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_disabled() {
        let state = ChannelState::default();
        assert!(!state.is_enabled());
        assert_eq!(state.count, 0);
        assert!(state.members.is_empty());
    }

    #[test]
    fn increments_create_member_lazily() {
        let mut state = ChannelState::enabled("c");
        state.apply(&Mutation::IncrementFails("alice".into()));
        state.apply(&Mutation::IncrementCounts("alice".into()));
        state.apply(&Mutation::IncrementCounts("alice".into()));
        assert_eq!(state.member("alice"), MemberRecord::new(2, 1));
        assert_eq!(state.member("bob"), MemberRecord::default());
        assert!(!state.members.contains_key("bob"));
    }

    #[test]
    fn set_count_never_goes_negative() {
        let mut state = ChannelState::enabled("c");
        state.apply(&Mutation::SetCount(-5));
        assert_eq!(state.count, 0);
    }

    #[test]
    fn next_count_stops_at_max() {
        let mut state = ChannelState::enabled("c");
        state.count = 41;
        assert_eq!(state.next_count(), Some(42));
        state.count = i64::MAX;
        assert_eq!(state.next_count(), None);
    }

    #[test]
    fn deserializes_legacy_document() {
        let json = r#"{
            "channelId": "123",
            "count": 41,
            "previousUserId": "u1",
            "previousMessageId": "m1",
            "users": {"u1": {"counts": 3, "fails": 1}},
            "history": [{"time": 1000, "count": 40}],
            "settings": {"oneByOne": true, "unlisted": true}
        }"#;
        let state: ChannelState = serde_json::from_str(json).unwrap();
        assert_eq!(state.count, 41);
        assert_eq!(state.previous_poster_id.as_deref(), Some("u1"));
        assert_eq!(state.member("u1"), MemberRecord::new(3, 1));
        assert!(state.settings.one_by_one);
        assert!(state.settings.unlisted());
        assert_eq!(state.history.len(), 1);
    }
}
