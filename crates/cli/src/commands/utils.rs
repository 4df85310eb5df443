use std::path::Path;

use eyre::{OptionExt, WrapErr};
use vidrank_sdk::{MemoryStore, Snapshot};

/// Content of a snapshot file: either a ready snapshot or a store dump.
#[derive(Debug)]
enum SnapshotFile {
    Snapshot(Snapshot),
    Store(MemoryStore),
}

impl SnapshotFile {
    /// Store dumps are told apart by their `accounts` table, anything else
    /// must be a well-formed snapshot.
    fn parse(content: &str) -> eyre::Result<Self> {
        let value = serde_json::from_str::<serde_json::Value>(content)?;
        let file = if value.get("accounts").is_some() {
            Self::Store(serde_json::from_value(value).wrap_err("invalid store dump")?)
        } else {
            Self::Snapshot(serde_json::from_value(value).wrap_err("invalid snapshot")?)
        };
        Ok(file)
    }
}

/// Read a snapshot for `account` from a JSON file.
///
/// The file holds either a [`Snapshot`] or a [`MemoryStore`] dump. A store
/// dump requires an account.
pub(crate) async fn load_snapshot(path: &Path, account: Option<&str>) -> eyre::Result<Snapshot> {
    let content = std::fs::read_to_string(path)?;
    match SnapshotFile::parse(&content)? {
        SnapshotFile::Snapshot(snapshot) => {
            if let Some(account) = account {
                if snapshot.side_data.account != account {
                    eyre::bail!(
                        "snapshot was taken for `{}`, not `{account}`",
                        snapshot.side_data.account
                    );
                }
            }
            Ok(snapshot)
        }
        SnapshotFile::Store(store) => {
            let account = account
                .ok_or_eyre("account is required for a store dump, pass `--account` or set it in the config")?;
            let snapshot = Snapshot::from_store(&store, account).await?;
            tracing::debug!(
                path = %path.display(),
                accounts = store.accounts().count(),
                "read snapshot from store dump"
            );
            Ok(snapshot)
        }
    }
}

const YEAR: u64 = 31_557_600;
const MONTH: u64 = 2_630_016;
const DAY: u64 = 86_400;
const HOUR: u64 = 3_600;
const MINUTE: u64 = 60;

const UNITS: [(u64, &str); 6] = [
    (YEAR, "year"),
    (MONTH, "month"),
    (DAY, "day"),
    (HOUR, "hour"),
    (MINUTE, "minute"),
    (1, "second"),
];

/// Coarse relative time in the largest whole unit, e.g. `Submitted 3 days ago`.
pub(crate) fn submitted_ago(timestamp: i64, now: i64) -> String {
    let secs = u64::try_from(now.saturating_sub(timestamp)).unwrap_or(0);
    let (unit, name) = UNITS
        .into_iter()
        .find(|(unit, _)| secs >= *unit)
        .unwrap_or((1, "second"));
    let count = secs / unit;
    let plural = if count == 1 { "" } else { "s" };
    format!("Submitted {count} {name}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_time() {
        let now = 1_700_000_000;
        assert_eq!(submitted_ago(now, now), "Submitted 0 seconds ago");
        assert_eq!(submitted_ago(now - 1, now), "Submitted 1 second ago");
        assert_eq!(submitted_ago(now - 42, now), "Submitted 42 seconds ago");
        assert_eq!(submitted_ago(now - 90, now), "Submitted 1 minute ago");
        assert_eq!(submitted_ago(now - 2 * HOUR as i64, now), "Submitted 2 hours ago");
        assert_eq!(submitted_ago(now - 3 * DAY as i64 - 5, now), "Submitted 3 days ago");
        assert_eq!(submitted_ago(now - 2 * YEAR as i64, now), "Submitted 2 years ago");
        assert_eq!(submitted_ago(now + 100, now), "Submitted 0 seconds ago");
    }

    #[test]
    fn snapshot_file_kinds() -> eyre::Result<()> {
        let snapshot = r#"{
            "records": [{"cid": "yt:a", "score": "1", "allTimeUpvotes": 0, "numUpvoters": 0,
                         "submittedInBlock": 0, "proposalTimestamp": 0}],
            "sideData": {"account": "alice", "upvoteIndices": {"yt:a": 0},
                         "withdrawableBalances": {"yt:a": "0"}}
        }"#;
        assert!(matches!(
            SnapshotFile::parse(snapshot)?,
            SnapshotFile::Snapshot(snapshot) if snapshot.side_data.account == "alice"
        ));

        let store = r#"{"records": [], "accounts": {"alice": {}}}"#;
        assert!(matches!(
            SnapshotFile::parse(store)?,
            SnapshotFile::Store(store) if store.accounts().count() == 1
        ));
        Ok(())
    }

    #[test]
    fn malformed_snapshot_is_not_a_store() {
        let snake_case = r#"{"records": [], "side_data": {"account": "alice"}}"#;
        let err = SnapshotFile::parse(snake_case).unwrap_err();
        assert!(err.to_string().contains("invalid snapshot"));

        assert!(SnapshotFile::parse("{}").is_err());
        assert!(SnapshotFile::parse(r#"{"accounts": {}, "extra": 1}"#).is_err());
    }
}
