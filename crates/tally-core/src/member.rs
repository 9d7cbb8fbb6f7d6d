//! Per-member counters.

use crate::leaderboard::cf_ratio;
use serde::{Deserialize, Serialize};

/// Successful and failed counting attempts of one member in one guild.
///
/// Both counters only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Accepted posts.
    #[serde(default)]
    pub counts: u64,
    /// Rejected posts.
    #[serde(default)]
    pub fails: u64,
}

impl MemberRecord {
    /// Record with the given counters.
    pub fn new(counts: u64, fails: u64) -> Self {
        Self { counts, fails }
    }

    pub(crate) fn increment_counts(&mut self) {
        self.counts = self.counts.saturating_add(1);
    }

    pub(crate) fn increment_fails(&mut self) {
        self.fails = self.fails.saturating_add(1);
    }

    /// Total attempts.
    pub fn attempts(&self) -> u64 {
        self.counts.saturating_add(self.fails)
    }

    /// Percentage of attempts that succeeded.
    pub fn cf_ratio(&self) -> u64 {
        cf_ratio(self.counts, self.fails)
    }

    /// Fold another record into this one.
    pub fn absorb(&mut self, other: &MemberRecord) {
        self.counts = self.counts.saturating_add(other.counts);
        self.fails = self.fails.saturating_add(other.fails);
    }
}
