use std::ops::Deref;

use crate::{
    cid::ServiceType,
    entry::{project_entry, ProjectedEntry, RawLeaderboardRecord, SideData},
    sort::{sort, SortSpec},
    store::Snapshot,
};

/// A projected entry with its position in the list it belongs to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
pub struct RankedEntry {
    /// The entry.
    #[cfg_attr(serde, serde(flatten))]
    pub entry: ProjectedEntry,
    /// 0-based rank.
    pub rank: usize,
}

impl AsRef<ProjectedEntry> for RankedEntry {
    fn as_ref(&self) -> &ProjectedEntry {
        &self.entry
    }
}

impl Deref for RankedEntry {
    type Target = ProjectedEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

/// A record left out of an assembled leaderboard.
#[derive(Debug)]
pub struct SkippedRecord {
    /// Content identifier of the record.
    pub cid: String,
    /// Why it was left out.
    pub error: crate::Error,
}

/// Result of [`assemble_with_report`].
#[derive(Debug, Default)]
pub struct Assembly {
    /// Ranked entries of the requested service type.
    pub entries: Vec<RankedEntry>,
    /// Records dropped because they could not be projected.
    pub skipped: Vec<SkippedRecord>,
}

/// Project, filter and rank records in input order.
///
/// Records with a malformed cid or score are left out. Missing side data
/// fails the whole assembly.
pub fn assemble(
    records: &[RawLeaderboardRecord],
    side_data: &SideData,
    filter: &ServiceType,
) -> crate::Result<Vec<RankedEntry>> {
    Ok(assemble_with_report(records, side_data, filter)?.entries)
}

/// Same as [`assemble`], but also reports the records that were left out.
pub fn assemble_with_report(
    records: &[RawLeaderboardRecord],
    side_data: &SideData,
    filter: &ServiceType,
) -> crate::Result<Assembly> {
    let mut assembly = Assembly::default();
    for record in records {
        let entry = match project_entry(record, side_data) {
            Ok(entry) => entry,
            Err(err) if err.is_record_local() => {
                #[cfg(tracing)]
                {
                    tracing::warn!(cid = %record.cid, %err, "skipping leaderboard record");
                }
                assembly.skipped.push(SkippedRecord {
                    cid: record.cid.clone(),
                    error: err,
                });
                continue;
            }
            Err(err) => return Err(err),
        };
        if entry.service_type != *filter {
            continue;
        }
        let rank = assembly.entries.len();
        assembly.entries.push(RankedEntry { entry, rank });
    }
    Ok(assembly)
}

/// Reassign ranks by position.
pub fn rerank(entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
    entries
        .into_iter()
        .enumerate()
        .map(|(rank, entry)| RankedEntry { rank, ..entry })
        .collect()
}

/// Build the displayed leaderboard of a snapshot.
///
/// Assembles the records, orders them by `spec` and ranks them by their
/// display position, so sorting by [`SortField::Rank`](crate::SortField::Rank)
/// orders by the position in the snapshot.
pub fn project(
    snapshot: &Snapshot,
    spec: &SortSpec,
    filter: &ServiceType,
) -> crate::Result<Vec<RankedEntry>> {
    let assembled = assemble(&snapshot.records, &snapshot.side_data, filter)?;
    Ok(rerank(sort(&assembled, spec)))
}
