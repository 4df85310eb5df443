use crate::{action::ActionKind, entry::SideDataKind};

/// Error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed content identifier.
    #[error("parse cid `{cid}`: {reason}")]
    Parse {
        /// The offending content identifier.
        cid: String,
        /// Why it failed to parse.
        reason: &'static str,
    },
    /// Upvote index or withdrawable balance is absent for a record.
    #[error("missing {kind} for `{cid}`")]
    MissingSideData {
        /// The record's content identifier.
        cid: String,
        /// Which side table is missing the record.
        kind: SideDataKind,
    },
    /// Score is not a number.
    #[error("invalid score `{score}` for `{cid}`")]
    InvalidScore {
        /// The record's content identifier.
        cid: String,
        /// The raw score.
        score: String,
    },
    /// The action gate is closed for this entry.
    #[error("{action} is not permitted for `{cid}`")]
    ActionNotPermitted {
        /// The refused action.
        action: ActionKind,
        /// The entry's content identifier.
        cid: String,
    },
    /// Custom error.
    #[error("custom: {0}")]
    Custom(String),
    /// JSON error.
    #[cfg(feature = "serde_json")]
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Reqwest error.
    #[cfg(feature = "reqwest")]
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Create a custom error.
    pub fn custom(msg: impl ToString) -> Self {
        Self::Custom(msg.to_string())
    }

    pub(crate) fn parse(cid: &str, reason: &'static str) -> Self {
        Self::Parse {
            cid: cid.to_string(),
            reason,
        }
    }

    /// Returns whether the error only concerns the record it was raised for.
    ///
    /// Such records are dropped from an assembled leaderboard instead of
    /// failing the whole projection.
    pub fn is_record_local(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::InvalidScore { .. })
    }
}

#[cfg(js)]
impl From<Error> for wasm_bindgen::JsValue {
    fn from(value: Error) -> Self {
        wasm_bindgen::JsError::new(&value.to_string()).into()
    }
}
