use indexmap::IndexMap;
use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use crate::{
    cid::{parse_cid, ServiceType},
    utils::number::parse_finite,
    Error,
};

/// Scale applied to raw scores for display.
pub const SCORE_SCALE: u32 = 1_000;

/// Display value of the upvote index for entries the account has not upvoted.
pub const NOT_UPVOTED: &str = "-";

/// A leaderboard record as stored on chain.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "camelCase"))]
pub struct RawLeaderboardRecord {
    /// Content identifier.
    #[builder(setter(into))]
    pub cid: String,
    /// Score as a decimal string.
    #[builder(setter(into))]
    pub score: String,
    /// Number of upvotes ever received.
    #[builder(default)]
    pub all_time_upvotes: u64,
    /// Number of distinct upvoters.
    #[builder(default)]
    pub num_upvoters: u64,
    /// Block in which the content was submitted.
    #[builder(default)]
    pub submitted_in_block: u64,
    /// Submission time in unix seconds.
    #[builder(default)]
    pub proposal_timestamp: i64,
}

/// Which per-account side table a lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SideDataKind {
    /// Upvote indices.
    UpvoteIndex,
    /// Withdrawable balances.
    WithdrawableBalance,
}

/// Per-account tables keyed by content identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "camelCase", default))]
pub struct AccountTables {
    /// 1-based upvote index of the account for each cid, `0` if not upvoted.
    pub upvote_indices: IndexMap<String, u64>,
    /// Withdrawable balance of the account for each cid.
    pub withdrawable_balances: IndexMap<String, Decimal>,
}

impl AccountTables {
    /// Record the side data of one cid.
    pub fn insert(
        &mut self,
        cid: impl Into<String>,
        upvote_index: u64,
        balance: Decimal,
    ) -> &mut Self {
        let cid = cid.into();
        self.upvote_indices.insert(cid.clone(), upvote_index);
        self.withdrawable_balances.insert(cid, balance);
        self
    }
}

/// Side data of the account the leaderboard is projected for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
pub struct SideData {
    /// The account.
    pub account: String,
    /// Its tables.
    #[cfg_attr(serde, serde(flatten))]
    pub tables: AccountTables,
}

impl SideData {
    /// Create empty side data for the given account.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            tables: Default::default(),
        }
    }

    /// Create from existing tables.
    pub fn from_tables(account: impl Into<String>, tables: AccountTables) -> Self {
        Self {
            account: account.into(),
            tables,
        }
    }

    /// Record the side data of one cid.
    pub fn insert(
        &mut self,
        cid: impl Into<String>,
        upvote_index: u64,
        balance: Decimal,
    ) -> &mut Self {
        self.tables.insert(cid, upvote_index, balance);
        self
    }

    /// Get the upvote index of the given cid.
    pub fn upvote_index(&self, cid: &str) -> Option<u64> {
        self.tables.upvote_indices.get(cid).copied()
    }

    /// Get the withdrawable balance of the given cid.
    pub fn withdrawable_balance(&self, cid: &str) -> Option<Decimal> {
        self.tables.withdrawable_balances.get(cid).copied()
    }
}

/// A leaderboard record normalized for the current account.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "camelCase"))]
pub struct ProjectedEntry {
    /// Content identifier.
    pub cid: String,
    /// Service type decoded from the cid.
    pub service_type: ServiceType,
    /// Service-specific id decoded from the cid.
    #[cfg_attr(serde, serde(rename = "serviceSpecificID"))]
    pub service_specific_id: String,
    /// Score scaled by [`SCORE_SCALE`], always finite.
    pub score: f64,
    /// Number of upvotes ever received.
    pub all_time_upvotes: u64,
    /// Number of distinct upvoters.
    pub num_upvoters: u64,
    /// Whether the account has upvoted this entry.
    pub has_upvoted: bool,
    /// [`NOT_UPVOTED`] or the 1-based upvote index of the account.
    pub upvote_index_display: String,
    /// Withdrawable balance of the account.
    pub withdrawable_balance: Decimal,
    /// Block in which the content was submitted.
    pub submitted_in_block: u64,
    /// Submission time in unix seconds.
    pub proposal_timestamp: i64,
}

impl AsRef<ProjectedEntry> for ProjectedEntry {
    fn as_ref(&self) -> &ProjectedEntry {
        self
    }
}

/// Project one record with the side data of the current account.
///
/// Side data must be present for every record: its absence is reported as
/// [`Error::MissingSideData`] before anything else is looked at.
pub fn project_entry(
    record: &RawLeaderboardRecord,
    side_data: &SideData,
) -> crate::Result<ProjectedEntry> {
    let cid = &record.cid;
    let upvote_index = side_data
        .upvote_index(cid)
        .ok_or_else(|| missing(cid, SideDataKind::UpvoteIndex))?;
    let withdrawable_balance = side_data
        .withdrawable_balance(cid)
        .ok_or_else(|| missing(cid, SideDataKind::WithdrawableBalance))?;

    let (service_type, service_specific_id) = parse_cid(cid)?;

    let score = parse_finite(&record.score)
        .map(|score| score * f64::from(SCORE_SCALE))
        .filter(|score| score.is_finite())
        .ok_or_else(|| Error::InvalidScore {
            cid: cid.clone(),
            score: record.score.clone(),
        })?;

    let has_upvoted = upvote_index != 0;
    let upvote_index_display = if has_upvoted {
        upvote_index.to_string()
    } else {
        NOT_UPVOTED.to_string()
    };

    Ok(ProjectedEntry {
        cid: cid.clone(),
        service_type,
        service_specific_id,
        score,
        all_time_upvotes: record.all_time_upvotes,
        num_upvoters: record.num_upvoters,
        has_upvoted,
        upvote_index_display,
        withdrawable_balance,
        submitted_in_block: record.submitted_in_block,
        proposal_timestamp: record.proposal_timestamp,
    })
}

fn missing(cid: &str, kind: SideDataKind) -> Error {
    Error::MissingSideData {
        cid: cid.to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn record(cid: &str, score: &str) -> RawLeaderboardRecord {
        RawLeaderboardRecord::builder()
            .cid(cid)
            .score(score)
            .all_time_upvotes(7)
            .num_upvoters(3)
            .submitted_in_block(1_024)
            .proposal_timestamp(1_560_000_000)
            .build()
    }

    #[test]
    fn not_upvoted() -> crate::Result<()> {
        let mut side = SideData::new("alice");
        side.insert("yt:abc", 0, dec!(1.5));

        let entry = project_entry(&record("yt:abc", "0.125"), &side)?;
        assert_eq!(entry.service_type, ServiceType::Youtube);
        assert_eq!(entry.service_specific_id, "abc");
        assert_eq!(entry.score, 125.0);
        assert!(!entry.has_upvoted);
        assert_eq!(entry.upvote_index_display, NOT_UPVOTED);
        assert_eq!(entry.withdrawable_balance, dec!(1.5));
        assert_eq!(entry.all_time_upvotes, 7);
        assert_eq!(entry.num_upvoters, 3);
        assert_eq!(entry.submitted_in_block, 1_024);
        assert_eq!(entry.proposal_timestamp, 1_560_000_000);
        Ok(())
    }

    #[test]
    fn upvoted() -> crate::Result<()> {
        let mut side = SideData::new("alice");
        side.insert("yt:abc", 4, Decimal::ZERO);

        let entry = project_entry(&record("yt:abc", "1"), &side)?;
        assert!(entry.has_upvoted);
        assert_eq!(entry.upvote_index_display, "4");
        assert_eq!(entry.score, 1000.0);
        Ok(())
    }

    #[test]
    fn missing_upvote_index() {
        let mut side = SideData::new("alice");
        side.tables
            .withdrawable_balances
            .insert("yt:abc".into(), dec!(1));

        let err = project_entry(&record("yt:abc", "1"), &side).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingSideData {
                kind: SideDataKind::UpvoteIndex,
                ..
            }
        ));
    }

    #[test]
    fn missing_balance() {
        let mut side = SideData::new("alice");
        side.tables.upvote_indices.insert("yt:abc".into(), 1);

        let err = project_entry(&record("yt:abc", "1"), &side).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingSideData {
                kind: SideDataKind::WithdrawableBalance,
                ..
            }
        ));
    }

    #[test]
    fn missing_side_data_wins_over_bad_cid() {
        let side = SideData::new("alice");
        let err = project_entry(&record("garbage", "nan"), &side).unwrap_err();
        assert!(matches!(err, Error::MissingSideData { .. }));
    }

    #[test]
    fn invalid_score() {
        let mut side = SideData::new("alice");
        side.insert("yt:abc", 0, dec!(0));

        let err = project_entry(&record("yt:abc", "lots"), &side).unwrap_err();
        assert!(matches!(err, Error::InvalidScore { .. }));
        assert!(err.is_record_local());
    }

    #[test]
    fn scientific_score() -> crate::Result<()> {
        let mut side = SideData::new("alice");
        side.insert("yt:abc", 0, dec!(0));

        let entry = project_entry(&record("yt:abc", "1.25e-1"), &side)?;
        assert_eq!(entry.score, 125.0);
        Ok(())
    }

    #[test]
    fn large_and_tiny_scores() -> crate::Result<()> {
        let mut side = SideData::new("alice");
        side.insert("yt:big", 0, dec!(0))
            .insert("yt:long", 0, dec!(0))
            .insert("yt:tiny", 0, dec!(0))
            .insert("yt:tinier", 0, dec!(0));

        let big = project_entry(&record("yt:big", "1e30"), &side)?;
        assert_eq!(big.score, 1e30 * 1000.0);

        let long = project_entry(
            &record("yt:long", "123456789012345678901234567890"),
            &side,
        )?;
        assert_eq!(long.score, 1.234_567_890_123_456_8e29 * 1000.0);
        assert!(long.score > big.score / 10.0);

        let tiny = project_entry(
            &record("yt:tiny", "0.00000000000000000000000000000123"),
            &side,
        )?;
        let tinier = project_entry(
            &record("yt:tinier", "0.00000000000000000000000000000122"),
            &side,
        )?;
        assert!(tiny.score > 0.0);
        assert!(tinier.score > 0.0);
        assert!(tiny.score > tinier.score);
        Ok(())
    }

    #[test]
    fn non_finite_scores_are_invalid() {
        let mut side = SideData::new("alice");
        side.insert("yt:abc", 0, dec!(0));

        for score in ["1e400", "NaN", "inf", "-inf", "1.7e308"] {
            let err = project_entry(&record("yt:abc", score), &side).unwrap_err();
            assert!(matches!(err, Error::InvalidScore { .. }), "{score}");
        }
    }
}
