use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::leaderboard::RankedEntry;

/// Field a leaderboard can be ordered by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "clap", value(rename_all = "snake_case"))]
pub enum SortField {
    /// Scaled score.
    #[default]
    Score,
    /// All-time upvotes.
    AllTimeUpvotes,
    /// Number of upvoters.
    NumUpvoters,
    /// Withdrawable balance.
    WithdrawableBalance,
    /// Submission time.
    ProposalTimestamp,
    /// Submission block.
    SubmittedInBlock,
    /// Rank.
    Rank,
    /// Content identifier.
    Cid,
    /// Service-specific id.
    ServiceSpecificId,
    /// Upvote index, compared as its display string.
    UpvoteIndex,
}

impl SortField {
    /// Whether the field is compared numerically.
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            Self::Cid | Self::ServiceSpecificId | Self::UpvoteIndex
        )
    }

    fn key<'a>(&self, entry: &'a RankedEntry) -> SortKey<'a> {
        match self {
            Self::Score => SortKey::Float(entry.score),
            Self::AllTimeUpvotes => SortKey::Number(entry.all_time_upvotes.into()),
            Self::NumUpvoters => SortKey::Number(entry.num_upvoters.into()),
            Self::WithdrawableBalance => SortKey::Number(entry.withdrawable_balance),
            Self::ProposalTimestamp => SortKey::Number(entry.proposal_timestamp.into()),
            Self::SubmittedInBlock => SortKey::Number(entry.submitted_in_block.into()),
            Self::Rank => SortKey::Number(entry.rank.into()),
            Self::Cid => SortKey::Text(&entry.cid),
            Self::ServiceSpecificId => SortKey::Text(&entry.service_specific_id),
            Self::UpvoteIndex => SortKey::Text(&entry.upvote_index_display),
        }
    }
}

/// Sort direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::EnumString, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

/// How to order a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(default))]
pub struct SortSpec {
    /// Field to compare.
    pub field: SortField,
    /// Direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Create a new spec.
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Ascending by the given field.
    pub fn ascending(field: SortField) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Descending by the given field.
    pub fn descending(field: SortField) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

#[derive(Debug, Clone, Copy)]
enum SortKey<'a> {
    Float(f64),
    Number(Decimal),
    Text(&'a str),
}

impl SortKey<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // Keys of one field always share a variant.
            _ => self.discriminant().cmp(&other.discriminant()),
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            Self::Float(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

/// Order entries by the given spec.
///
/// Entries are stably sorted in ascending order and the whole list is then
/// reversed for [`SortDirection::Desc`], so entries that compare equal keep
/// their input order when ascending and come out in reverse input order when
/// descending.
pub fn sort(entries: &[RankedEntry], spec: &SortSpec) -> Vec<RankedEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| compare(spec.field, a, b));
    if spec.direction == SortDirection::Desc {
        sorted.reverse();
    }
    sorted
}

fn compare(field: SortField, a: &RankedEntry, b: &RankedEntry) -> Ordering {
    field.key(a).compare(&field.key(b))
}
