//! Per-guild game settings.

use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a guild shows up on public leaderboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Listed on public leaderboards.
    #[default]
    Public,
    /// Only reachable by guild id.
    Unlisted,
}

impl Visibility {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
        }
    }

    /// Map the legacy boolean onto the enum.
    pub fn from_unlisted(unlisted: bool) -> Self {
        if unlisted { Self::Unlisted } else { Self::Public }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            _ => Err(CoreError::UnknownVisibility(s.to_string())),
        }
    }
}

/// Boolean toggles controlling engine behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// A member may not post two counts in a row.
    pub one_by_one: bool,
    /// Any violation resets the count to 0 instead of deleting the message.
    pub reset_on_fail: bool,
    /// Extra text after the number is allowed.
    pub talking: bool,
    /// Deleting the last accepted count reposts it.
    pub no_deletion: bool,
    /// Pin every count divisible by ten.
    pub pin_milestones: bool,
    /// Leaderboard visibility.
    pub visibility: Visibility,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            one_by_one: false,
            reset_on_fail: false,
            talking: true,
            no_deletion: true,
            pin_milestones: false,
            visibility: Visibility::Public,
        }
    }
}

impl Settings {
    /// Derived from [`Settings::visibility`].
    pub fn unlisted(&self) -> bool {
        self.visibility == Visibility::Unlisted
    }

    /// Read a toggle by key.
    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::OneByOne => self.one_by_one,
            SettingKey::ResetOnFail => self.reset_on_fail,
            SettingKey::Talking => self.talking,
            SettingKey::NoDeletion => self.no_deletion,
            SettingKey::PinMilestones => self.pin_milestones,
            SettingKey::Unlisted => self.unlisted(),
        }
    }

    /// Write a toggle by key.
    pub fn set(&mut self, key: SettingKey, value: bool) {
        match key {
            SettingKey::OneByOne => self.one_by_one = value,
            SettingKey::ResetOnFail => self.reset_on_fail = value,
            SettingKey::Talking => self.talking = value,
            SettingKey::NoDeletion => self.no_deletion = value,
            SettingKey::PinMilestones => self.pin_milestones = value,
            SettingKey::Unlisted => self.visibility = Visibility::from_unlisted(value),
        }
    }
}

/// Wire form accepting both the legacy `unlisted` flag and `visibility`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsRepr {
    #[serde(default)]
    one_by_one: bool,
    #[serde(default)]
    reset_on_fail: bool,
    #[serde(default = "default_true")]
    talking: bool,
    #[serde(default = "default_true")]
    no_deletion: bool,
    #[serde(default)]
    pin_milestones: bool,
    #[serde(default)]
    unlisted: Option<bool>,
    #[serde(default)]
    visibility: Option<Visibility>,
}

fn default_true() -> bool {
    true
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = SettingsRepr::deserialize(deserializer)?;
        let visibility = repr
            .visibility
            .or(repr.unlisted.map(Visibility::from_unlisted))
            .unwrap_or_default();
        Ok(Self {
            one_by_one: repr.one_by_one,
            reset_on_fail: repr.reset_on_fail,
            talking: repr.talking,
            no_deletion: repr.no_deletion,
            pin_milestones: repr.pin_milestones,
            visibility,
        })
    }
}

/// Name of a single boolean setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// See [`Settings::one_by_one`].
    OneByOne,
    /// See [`Settings::reset_on_fail`].
    ResetOnFail,
    /// See [`Settings::talking`].
    Talking,
    /// See [`Settings::no_deletion`].
    NoDeletion,
    /// See [`Settings::pin_milestones`].
    PinMilestones,
    /// Boolean view of [`Settings::visibility`].
    Unlisted,
}

impl SettingKey {
    /// All keys, in display order.
    pub const ALL: [SettingKey; 6] = [
        Self::OneByOne,
        Self::ResetOnFail,
        Self::Talking,
        Self::NoDeletion,
        Self::PinMilestones,
        Self::Unlisted,
    ];

    /// Snake-case command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneByOne => "one_by_one",
            Self::ResetOnFail => "reset_on_fail",
            Self::Talking => "talking",
            Self::NoDeletion => "no_deletion",
            Self::PinMilestones => "pin_milestones",
            Self::Unlisted => "unlisted",
        }
    }

    /// Human readable label used in replies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneByOne => "one by one",
            Self::ResetOnFail => "reset on fail",
            Self::Talking => "talking",
            Self::NoDeletion => "no deletion",
            Self::PinMilestones => "pin milestones",
            Self::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_by_one" | "oneByOne" => Ok(Self::OneByOne),
            "reset_on_fail" | "resetOnFail" => Ok(Self::ResetOnFail),
            "talking" => Ok(Self::Talking),
            "no_deletion" | "noDeletion" => Ok(Self::NoDeletion),
            "pin_milestones" | "pinMilestones" => Ok(Self::PinMilestones),
            "unlisted" => Ok(Self::Unlisted),
            _ => Err(CoreError::UnknownSetting(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_talking_and_no_deletion_only() {
        let s = Settings::default();
        assert!(!s.one_by_one);
        assert!(!s.reset_on_fail);
        assert!(s.talking);
        assert!(s.no_deletion);
        assert!(!s.pin_milestones);
        assert!(!s.unlisted());
    }

    #[test]
    fn legacy_unlisted_flag_maps_to_visibility() {
        let s: Settings = serde_json::from_str(r#"{"unlisted": true}"#).unwrap();
        assert_eq!(s.visibility, Visibility::Unlisted);
        assert!(s.talking, "missing fields keep their defaults");
    }

    #[test]
    fn visibility_wins_over_legacy_flag() {
        let s: Settings =
            serde_json::from_str(r#"{"unlisted": true, "visibility": "public"}"#).unwrap();
        assert_eq!(s.visibility, Visibility::Public);
    }

    #[test]
    fn serializes_canonical_visibility() {
        let mut s = Settings::default();
        s.set(SettingKey::Unlisted, true);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["visibility"], "unlisted");
        assert!(json.get("unlisted").is_none());
    }

    #[test]
    fn setting_key_round_trips_through_names() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
        assert!(matches!(
            "loud".parse::<SettingKey>(),
            Err(CoreError::UnknownSetting(_))
        ));
    }

    #[test]
    fn get_and_set_by_key() {
        let mut s = Settings::default();
        s.set(SettingKey::OneByOne, true);
        s.set(SettingKey::Talking, false);
        assert!(s.get(SettingKey::OneByOne));
        assert!(!s.get(SettingKey::Talking));
    }
}
