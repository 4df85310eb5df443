#![deny(missing_docs)]
#![deny(unreachable_pub)]

//! # Vidrank SDK
//!
//! Turns raw on-chain leaderboard state into a filtered, sorted and ranked
//! list of entries, decides whether the current account may upvote or
//! withdraw for each of them, and coordinates metadata lookups so that every
//! video identifier is requested at most once.

/// Error type.
pub mod error;

/// Content identifier parsing.
pub mod cid;

/// Entry projection.
pub mod entry;

/// Leaderboard assembly.
pub mod leaderboard;

/// Sorting.
pub mod sort;

/// Metadata fetch coordination.
pub mod metadata;

/// Action gating.
pub mod action;

/// Chain-state store.
pub mod store;

/// Utils.
pub mod utils;

/// JS bindings.
#[cfg(js)]
pub mod js;

pub use crate::{
    action::{can_upvote, can_withdraw, ActionAvailability, ActionDispatcher, ActionKind},
    cid::{parse_cid, ServiceType},
    entry::{project_entry, ProjectedEntry, RawLeaderboardRecord, SideData},
    error::Error,
    leaderboard::{assemble, project, RankedEntry},
    metadata::{FetchCoordinator, FetchState, MetadataCache, VideoMetadata},
    sort::{sort, SortDirection, SortField, SortSpec},
    store::{ChainStateStore, MemoryStore, Snapshot},
};

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

pub use rust_decimal;
