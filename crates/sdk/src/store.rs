use std::future::Future;

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::entry::{AccountTables, RawLeaderboardRecord, SideData};

/// Read access to leaderboard chain state.
pub trait ChainStateStore {
    /// Get all leaderboard records, in chain order.
    fn leaderboard_records(
        &self,
    ) -> impl Future<Output = crate::Result<Vec<RawLeaderboardRecord>>> + Send;

    /// Get the upvote index of `account` for `cid`, `0` if not upvoted.
    ///
    /// Returns `None` if the store knows nothing about the pair.
    fn upvote_index(
        &self,
        cid: &str,
        account: &str,
    ) -> impl Future<Output = crate::Result<Option<u64>>> + Send;

    /// Get the withdrawable balance of `account` for `cid`.
    ///
    /// Returns `None` if the store knows nothing about the pair.
    fn withdrawable_balance(
        &self,
        cid: &str,
        account: &str,
    ) -> impl Future<Output = crate::Result<Option<Decimal>>> + Send;
}

/// Records and side data for one account, read at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "camelCase"))]
pub struct Snapshot {
    /// Leaderboard records.
    pub records: Vec<RawLeaderboardRecord>,
    /// Side data of the account.
    pub side_data: SideData,
}

impl Snapshot {
    /// Read a snapshot for `account` from the given store.
    ///
    /// Side data the store does not know about is left out, so that
    /// projecting the affected records reports it.
    pub async fn from_store<S: ChainStateStore>(store: &S, account: &str) -> crate::Result<Self> {
        let records = store.leaderboard_records().await?;
        let mut side_data = SideData::new(account);
        for record in &records {
            let cid = &record.cid;
            if let Some(index) = store.upvote_index(cid, account).await? {
                side_data.tables.upvote_indices.insert(cid.clone(), index);
            }
            if let Some(balance) = store.withdrawable_balance(cid, account).await? {
                side_data
                    .tables
                    .withdrawable_balances
                    .insert(cid.clone(), balance);
            }
        }
        #[cfg(tracing)]
        {
            tracing::debug!(
                account,
                records = records.len(),
                "read leaderboard snapshot"
            );
        }
        Ok(Self { records, side_data })
    }
}

/// In-memory chain state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(default, deny_unknown_fields))]
pub struct MemoryStore {
    /// Leaderboard records.
    pub records: Vec<RawLeaderboardRecord>,
    /// Side tables by account.
    pub accounts: IndexMap<String, AccountTables>,
}

impl MemoryStore {
    /// Append a record.
    pub fn push_record(&mut self, record: RawLeaderboardRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    /// Set the side data of `account` for `cid`.
    pub fn set_side_data(
        &mut self,
        account: &str,
        cid: &str,
        upvote_index: u64,
        balance: Decimal,
    ) -> &mut Self {
        self.accounts
            .entry(account.to_string())
            .or_default()
            .insert(cid, upvote_index, balance);
        self
    }

    /// Get the accounts known to the store.
    pub fn accounts(&self) -> impl Iterator<Item = &str> + '_ {
        self.accounts.keys().map(String::as_str)
    }

    fn tables(&self, account: &str) -> Option<&AccountTables> {
        self.accounts.get(account)
    }
}

impl ChainStateStore for MemoryStore {
    async fn leaderboard_records(&self) -> crate::Result<Vec<RawLeaderboardRecord>> {
        Ok(self.records.clone())
    }

    async fn upvote_index(&self, cid: &str, account: &str) -> crate::Result<Option<u64>> {
        Ok(self
            .tables(account)
            .and_then(|tables| tables.upvote_indices.get(cid).copied()))
    }

    async fn withdrawable_balance(
        &self,
        cid: &str,
        account: &str,
    ) -> crate::Result<Option<Decimal>> {
        Ok(self
            .tables(account)
            .and_then(|tables| tables.withdrawable_balances.get(cid).copied()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{cid::ServiceType, leaderboard::project, sort::SortSpec, Error};

    use super::*;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::default();
        for (cid, score) in [("yt:a", "0.1"), ("yt:b", "0.3")] {
            store.push_record(RawLeaderboardRecord::builder().cid(cid).score(score).build());
        }
        store
            .set_side_data("alice", "yt:a", 2, dec!(0))
            .set_side_data("alice", "yt:b", 0, dec!(0.75))
            .set_side_data("bob", "yt:a", 0, dec!(1))
            .set_side_data("bob", "yt:b", 1, dec!(0));
        store
    }

    #[tokio::test]
    async fn snapshot_per_account() -> crate::Result<()> {
        let store = store();

        let alice = Snapshot::from_store(&store, "alice").await?;
        assert_eq!(alice.records.len(), 2);
        assert_eq!(alice.side_data.account, "alice");
        assert_eq!(alice.side_data.upvote_index("yt:a"), Some(2));
        assert_eq!(alice.side_data.withdrawable_balance("yt:b"), Some(dec!(0.75)));

        let bob = Snapshot::from_store(&store, "bob").await?;
        let entries = project(&bob, &SortSpec::default(), &ServiceType::Youtube)?;
        let upvoted = entries
            .iter()
            .map(|e| (e.cid.as_str(), e.has_upvoted))
            .collect::<Vec<_>>();
        assert_eq!(upvoted, [("yt:b", true), ("yt:a", false)]);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_account_fails_projection() -> crate::Result<()> {
        let store = store();
        let carol = Snapshot::from_store(&store, "carol").await?;
        assert!(carol.side_data.tables.upvote_indices.is_empty());

        let err = project(&carol, &SortSpec::default(), &ServiceType::Youtube).unwrap_err();
        assert!(matches!(err, Error::MissingSideData { .. }));
        Ok(())
    }

    #[test]
    fn accounts() {
        let store = store();
        assert_eq!(store.accounts().collect::<Vec<_>>(), ["alice", "bob"]);
    }

    #[cfg(serde)]
    #[test]
    fn store_dump_rejects_unknown_fields() {
        let dump = r#"{"records":[],"accounts":{"alice":{"upvoteIndices":{"yt:a":1}}}}"#;
        let store = serde_json::from_str::<MemoryStore>(dump).unwrap();
        let tables = store.tables("alice").unwrap();
        assert_eq!(tables.upvote_indices.get("yt:a"), Some(&1));

        let snapshot = r#"{"records":[],"side_data":{"account":"alice"}}"#;
        assert!(serde_json::from_str::<MemoryStore>(snapshot).is_err());
    }
}
