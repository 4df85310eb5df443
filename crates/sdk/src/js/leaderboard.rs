use std::{
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use crate::{
    action::ActionAvailability,
    cid::ServiceType,
    leaderboard::{project, RankedEntry},
    metadata::{FetchCoordinator, MetadataCache, MetadataRequester, VideoMetadata},
    sort::{SortDirection, SortField, SortSpec},
    store::Snapshot,
};

/// Options for [`JsLeaderboard::project`].
#[derive(Debug, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOptions {
    /// Field to sort by. Defaults to `score`.
    #[serde(default)]
    pub sort_field: Option<String>,
    /// `asc` or `desc`. Defaults to `desc`.
    #[serde(default)]
    pub direction: Option<String>,
    /// Service type tag to show. Defaults to `yt`.
    #[serde(default)]
    pub service_type: Option<String>,
}

impl ProjectOptions {
    fn sort_spec(&self) -> crate::Result<SortSpec> {
        let field = self
            .sort_field
            .as_deref()
            .map(SortField::from_str)
            .transpose()
            .map_err(crate::Error::custom)?
            .unwrap_or_default();
        let direction = self
            .direction
            .as_deref()
            .map(SortDirection::from_str)
            .transpose()
            .map_err(crate::Error::custom)?
            .unwrap_or_default();
        Ok(SortSpec::new(field, direction))
    }

    fn filter(&self) -> ServiceType {
        self.service_type
            .as_deref()
            .map(ServiceType::from_tag)
            .unwrap_or_default()
    }
}

/// One displayed row.
#[derive(Debug, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    /// 0-based display position.
    pub rank: usize,
    /// Content identifier.
    pub cid: String,
    /// Service type tag.
    pub service_type: String,
    /// Service-specific id.
    #[serde(rename = "serviceSpecificID")]
    pub service_specific_id: String,
    /// Scaled score.
    pub score: String,
    /// All-time upvotes.
    pub all_time_upvotes: u64,
    /// Number of upvoters.
    pub num_upvoters: u64,
    /// `-` or the upvote index of the account.
    pub upvote_index: String,
    /// Withdrawable balance.
    pub withdrawable_balance: String,
    /// Submission block.
    pub submitted_in_block: u64,
    /// Submission time in unix seconds.
    pub proposal_timestamp: i64,
    /// Whether the upvote action is shown.
    pub can_upvote: bool,
    /// Whether the withdraw action is shown.
    pub can_withdraw: bool,
    /// Title, once resolved.
    pub title: Option<String>,
}

impl LeaderboardRow {
    fn new(entry: &RankedEntry, title: Option<String>) -> Self {
        let gate = ActionAvailability::of(entry);
        Self {
            rank: entry.rank,
            cid: entry.cid.clone(),
            service_type: entry.service_type.to_string(),
            service_specific_id: entry.service_specific_id.clone(),
            score: entry.score.to_string(),
            all_time_upvotes: entry.all_time_upvotes,
            num_upvoters: entry.num_upvoters,
            upvote_index: entry.upvote_index_display.clone(),
            withdrawable_balance: entry.withdrawable_balance.to_string(),
            submitted_in_block: entry.submitted_in_block,
            proposal_timestamp: entry.proposal_timestamp,
            can_upvote: gate.can_upvote,
            can_withdraw: gate.can_withdraw,
            title,
        }
    }
}

/// Projected leaderboard.
#[derive(Debug, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardView {
    /// Rows in display order.
    pub rows: Vec<LeaderboardRow>,
    /// Service-specific ids whose metadata has never been requested.
    pub unfetched: Vec<String>,
}

/// Collects the ids the coordinator asks for, to be handed to the page.
#[derive(Debug, Default)]
struct Outbox {
    ids: Mutex<Vec<String>>,
}

impl Outbox {
    fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.ids.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl MetadataRequester for Outbox {
    fn request(&self, id: &str) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id.to_string());
    }
}

/// Leaderboard of one snapshot, together with the metadata cache of the page.
#[wasm_bindgen(js_name = Leaderboard)]
#[derive(Clone)]
pub struct JsLeaderboard {
    snapshot: Arc<Snapshot>,
    fetcher: Arc<FetchCoordinator<Outbox>>,
}

impl JsLeaderboard {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            fetcher: Arc::new(FetchCoordinator::new(
                Arc::new(MetadataCache::new()),
                Outbox::default(),
            )),
        }
    }

    fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Arc::new(snapshot);
    }

    fn cache(&self) -> &MetadataCache {
        self.fetcher.cache()
    }
}

#[wasm_bindgen(js_class = Leaderboard)]
impl JsLeaderboard {
    /// Create from a snapshot object.
    #[wasm_bindgen(constructor)]
    pub fn new(snapshot: JsValue) -> crate::Result<Self> {
        let snapshot: Snapshot =
            serde_wasm_bindgen::from_value(snapshot).map_err(crate::Error::custom)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Replace the snapshot, keeping the metadata cache.
    pub fn update(&mut self, snapshot: JsValue) -> crate::Result<()> {
        let snapshot: Snapshot =
            serde_wasm_bindgen::from_value(snapshot).map_err(crate::Error::custom)?;
        self.set_snapshot(snapshot);
        Ok(())
    }

    /// Project the snapshot.
    ///
    /// Ids listed in `unfetched` are marked pending: the caller is expected
    /// to request them and report back with
    /// [`complete_fetch`](Self::complete_fetch).
    pub fn project(&self, options: Option<ProjectOptions>) -> crate::Result<LeaderboardView> {
        let options = options.unwrap_or_default();
        let entries = project(&self.snapshot, &options.sort_spec()?, &options.filter())?;
        self.fetcher.ensure_fetched_all(&entries);
        let rows = entries
            .iter()
            .map(|entry| {
                let title = self.fetcher.title(&entry.service_specific_id);
                LeaderboardRow::new(entry, title)
            })
            .collect();
        Ok(LeaderboardView {
            rows,
            unfetched: self.fetcher.requester().drain(),
        })
    }

    /// Record the outcome of a metadata request. Pass no title on failure.
    pub fn complete_fetch(&self, id: &str, title: Option<String>) -> bool {
        self.cache()
            .complete(id, title.map(|title| VideoMetadata { title }))
    }

    /// Get the resolved title of `id`.
    pub fn title(&self, id: &str) -> Option<String> {
        self.cache().title(id)
    }

    /// Returns `true` if no request is in flight.
    pub fn is_settled(&self) -> bool {
        self.cache().is_settled()
    }

    /// Create a clone of this leaderboard.
    #[wasm_bindgen(js_name = clone)]
    pub fn js_clone(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::{
        entry::{RawLeaderboardRecord, SideData},
        metadata::FetchState,
    };

    use super::*;

    fn snapshot(cids: &[&str]) -> Snapshot {
        let mut side_data = SideData::new("alice");
        let records = cids
            .iter()
            .map(|cid| {
                side_data.insert(*cid, 0, Decimal::ZERO);
                RawLeaderboardRecord::builder().cid(*cid).score("1").build()
            })
            .collect();
        Snapshot {
            records,
            side_data,
        }
    }

    fn ids(view: &LeaderboardView) -> Vec<&str> {
        view.rows
            .iter()
            .map(|row| row.service_specific_id.as_str())
            .collect()
    }

    #[test]
    fn lists_each_id_once() -> crate::Result<()> {
        let leaderboard = JsLeaderboard::from_snapshot(snapshot(&["yt:a", "yt:b", "yt:c"]));

        let first = leaderboard.project(None)?;
        let mut unfetched = first.unfetched.clone();
        unfetched.sort();
        assert_eq!(unfetched, ["a", "b", "c"]);
        assert!(!leaderboard.is_settled());

        for _ in 0..3 {
            let view = leaderboard.project(None)?;
            assert!(view.unfetched.is_empty());
            assert_eq!(ids(&view), ids(&first));
        }
        Ok(())
    }

    #[test]
    fn failed_fetch_is_not_retried() -> crate::Result<()> {
        let leaderboard = JsLeaderboard::from_snapshot(snapshot(&["yt:a", "yt:b"]));
        leaderboard.project(None)?;

        assert!(leaderboard.complete_fetch("a", None));
        assert!(leaderboard.complete_fetch("b", Some("Bee".into())));
        assert!(!leaderboard.complete_fetch("a", Some("late".into())));
        assert!(leaderboard.is_settled());
        assert_eq!(leaderboard.cache().state("a"), Some(FetchState::Failed));
        assert_eq!(leaderboard.title("a"), None);

        let view = leaderboard.project(None)?;
        assert!(view.unfetched.is_empty());
        for row in &view.rows {
            match row.service_specific_id.as_str() {
                "a" => assert_eq!(row.title, None),
                "b" => assert_eq!(row.title.as_deref(), Some("Bee")),
                other => panic!("unexpected row {other}"),
            }
        }
        Ok(())
    }

    #[test]
    fn new_snapshot_keeps_titles() -> crate::Result<()> {
        let mut leaderboard = JsLeaderboard::from_snapshot(snapshot(&["yt:a"]));
        leaderboard.project(None)?;
        assert!(leaderboard.complete_fetch("a", Some("Ay".into())));

        let shared = leaderboard.js_clone();
        leaderboard.set_snapshot(snapshot(&["yt:a", "yt:b"]));

        let view = leaderboard.project(None)?;
        assert_eq!(view.unfetched, ["b"]);
        let a = view
            .rows
            .iter()
            .find(|row| row.service_specific_id == "a")
            .expect("row a");
        assert_eq!(a.title.as_deref(), Some("Ay"));

        assert_eq!(shared.title("a").as_deref(), Some("Ay"));
        assert_eq!(shared.cache().state("b"), Some(FetchState::Pending));
        Ok(())
    }
}
