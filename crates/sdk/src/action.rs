use std::future::Future;

use rust_decimal::Decimal;

use crate::{entry::ProjectedEntry, Error};

/// Whether the current account may upvote the entry.
///
/// An account upvotes a given cid at most once.
pub fn can_upvote(entry: &ProjectedEntry) -> bool {
    !entry.has_upvoted
}

/// Whether the current account has anything to withdraw from the entry.
pub fn can_withdraw(entry: &ProjectedEntry) -> bool {
    entry.withdrawable_balance > Decimal::ZERO
}

/// State-changing action on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "snake_case"))]
pub enum ActionKind {
    /// Upvote.
    Upvote,
    /// Withdraw.
    Withdraw,
}

impl ActionKind {
    /// Whether the gate is open for this action on the entry.
    pub fn is_permitted(&self, entry: &ProjectedEntry) -> bool {
        match self {
            Self::Upvote => can_upvote(entry),
            Self::Withdraw => can_withdraw(entry),
        }
    }
}

/// Gate decisions of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "camelCase"))]
pub struct ActionAvailability {
    /// See [`can_upvote`].
    pub can_upvote: bool,
    /// See [`can_withdraw`].
    pub can_withdraw: bool,
}

impl ActionAvailability {
    /// Compute the gate decisions of an entry.
    pub fn of(entry: &ProjectedEntry) -> Self {
        Self {
            can_upvote: can_upvote(entry),
            can_withdraw: can_withdraw(entry),
        }
    }
}

/// Applies actions on chain.
pub trait ActionDispatcher {
    /// Receipt of a dispatched action.
    type Receipt;

    /// Upvote `cid` as `account`.
    fn dispatch_upvote(
        &self,
        cid: &str,
        account: &str,
    ) -> impl Future<Output = crate::Result<Self::Receipt>> + Send;

    /// Withdraw the balance of `account` from `cid`.
    fn dispatch_withdraw(
        &self,
        cid: &str,
        account: &str,
    ) -> impl Future<Output = crate::Result<Self::Receipt>> + Send;
}

/// Dispatch `action` for the entry if its gate is open.
///
/// Returns [`Error::ActionNotPermitted`] without calling the dispatcher
/// otherwise. The entry is not updated: the change becomes visible once a
/// new snapshot is projected.
pub async fn dispatch<D: ActionDispatcher>(
    dispatcher: &D,
    action: ActionKind,
    entry: &ProjectedEntry,
    account: &str,
) -> crate::Result<D::Receipt> {
    if !action.is_permitted(entry) {
        #[cfg(tracing)]
        {
            tracing::debug!(%action, cid = %entry.cid, "action gate is closed");
        }
        return Err(Error::ActionNotPermitted {
            action,
            cid: entry.cid.clone(),
        });
    }
    match action {
        ActionKind::Upvote => dispatcher.dispatch_upvote(&entry.cid, account).await,
        ActionKind::Withdraw => dispatcher.dispatch_withdraw(&entry.cid, account).await,
    }
}

/// Upvote the entry if the account has not upvoted it yet.
pub async fn upvote<D: ActionDispatcher>(
    dispatcher: &D,
    entry: &ProjectedEntry,
    account: &str,
) -> crate::Result<D::Receipt> {
    dispatch(dispatcher, ActionKind::Upvote, entry, account).await
}

/// Withdraw from the entry if there is anything to withdraw.
pub async fn withdraw<D: ActionDispatcher>(
    dispatcher: &D,
    entry: &ProjectedEntry,
    account: &str,
) -> crate::Result<D::Receipt> {
    dispatch(dispatcher, ActionKind::Withdraw, entry, account).await
}
