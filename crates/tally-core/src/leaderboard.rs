//! Ranked views over stored channel states.
//!
//! Every function here is a pure fold; nothing is cached. Sorting is
//! descending and stable, so ties keep input order (member ids are ordered
//! within a guild, guild order is whatever the snapshot yields).

use crate::error::CoreError;
use crate::member::MemberRecord;
use crate::state::ChannelState;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Number of entries shown on a leaderboard.
pub const DEFAULT_TOP: usize = 10;

/// Percentage of attempts that succeeded, rounded half-up.
///
/// A member who never counted scores 0 regardless of fails.
///
/// ```
/// use tally_core::cf_ratio;
/// assert_eq!(cf_ratio(7, 3), 70);
/// assert_eq!(cf_ratio(0, 0), 0);
/// assert_eq!(cf_ratio(1, 7), 13);
/// ```
pub fn cf_ratio(counts: u64, fails: u64) -> u64 {
    if counts == 0 {
        return 0;
    }
    let counts = u128::from(counts);
    let attempts = counts + u128::from(fails);
    // round(100c / t) == floor((200c + t) / 2t)
    ((200 * counts + attempts) / (2 * attempts)) as u64
}

/// What a member leaderboard is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Accepted posts.
    Counts,
    /// Rejected posts.
    Fails,
    /// [`cf_ratio`] of the two.
    #[default]
    CfRatio,
}

impl Metric {
    /// Every metric.
    pub const ALL: [Metric; 3] = [Metric::Counts, Metric::Fails, Metric::CfRatio];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counts => "counts",
            Self::Fails => "fails",
            Self::CfRatio => "cf_ratio",
        }
    }

    /// Heading used on leaderboards.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Counts => "Counts",
            Self::Fails => "Fails",
            Self::CfRatio => "C/F Ratio",
        }
    }

    /// Value of this metric for one record.
    pub fn of(&self, record: &MemberRecord) -> u64 {
        match self {
            Self::Counts => record.counts,
            Self::Fails => record.fails,
            Self::CfRatio => record.cf_ratio(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counts" => Ok(Self::Counts),
            "fails" => Ok(Self::Fails),
            "cf_ratio" | "cfRatio" => Ok(Self::CfRatio),
            other => Err(CoreError::UnknownMetric(other.to_string())),
        }
    }
}

/// One line of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    /// Guild id or member id.
    pub subject_id: String,
    /// Metric value.
    pub value: u64,
}

/// An ordered leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    /// Top entries, best first.
    pub entries: Vec<RankEntry>,
    /// Aggregate over the whole population, not just `entries`.
    pub total: u64,
}

impl Ranking {
    /// One page of entries, 1-based. Page 0 is treated as page 1.
    pub fn page(&self, page: usize, per_page: usize) -> &[RankEntry] {
        let start = page.max(1).saturating_sub(1).saturating_mul(per_page);
        if start >= self.entries.len() {
            return &[];
        }
        let end = start.saturating_add(per_page).min(self.entries.len());
        &self.entries[start..end]
    }

    /// Whether nothing was ranked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn build(mut entries: Vec<RankEntry>, total: u64, top: usize) -> Self {
        entries.sort_by(|a, b| b.value.cmp(&a.value));
        entries.truncate(top);
        Self { entries, total }
    }
}

/// Rank guilds by count, leaving out unlisted ones.
pub fn rank_servers<'a, I>(states: I, top: usize) -> Ranking
where
    I: IntoIterator<Item = (&'a str, &'a ChannelState)>,
{
    let entries: Vec<RankEntry> = states
        .into_iter()
        .filter(|(_, state)| !state.settings.unlisted())
        .map(|(id, state)| RankEntry {
            subject_id: id.to_string(),
            value: state.count.max(0) as u64,
        })
        .collect();
    let total = entries.iter().fold(0u64, |acc, e| acc.saturating_add(e.value));
    Ranking::build(entries, total, top)
}

/// Rank the members of one guild.
pub fn rank_channel(state: &ChannelState, metric: Metric, top: usize) -> Ranking {
    rank_members(state.members.iter().map(|(id, record)| (id.as_str(), record)), metric, top)
}

/// Rank members across every guild, summing their records first.
pub fn rank_global<'a, I>(states: I, metric: Metric, top: usize) -> Ranking
where
    I: IntoIterator<Item = &'a ChannelState>,
{
    let merged = aggregate_members(states);
    rank_members(merged.iter().map(|(id, record)| (id.as_str(), record)), metric, top)
}

/// Sum every member's records across `states`, in first-seen order.
pub fn aggregate_members<'a, I>(states: I) -> Vec<(String, MemberRecord)>
where
    I: IntoIterator<Item = &'a ChannelState>,
{
    let mut merged: Vec<(String, MemberRecord)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for state in states {
        for (id, record) in &state.members {
            match index.get(id.as_str()) {
                Some(&slot) => merged[slot].1.absorb(record),
                None => {
                    index.insert(id.as_str(), merged.len());
                    merged.push((id.clone(), *record));
                }
            }
        }
    }
    merged
}

fn rank_members<'a, I>(members: I, metric: Metric, top: usize) -> Ranking
where
    I: IntoIterator<Item = (&'a str, &'a MemberRecord)>,
{
    let mut sum = MemberRecord::default();
    let entries: Vec<RankEntry> = members
        .into_iter()
        .map(|(id, record)| {
            sum.absorb(record);
            RankEntry {
                subject_id: id.to_string(),
                value: metric.of(record),
            }
        })
        .collect();
    Ranking::build(entries, metric.of(&sum), top)
}
