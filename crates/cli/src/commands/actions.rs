use std::path::PathBuf;

use eyre::OptionExt;
use vidrank_sdk::{project_entry, ActionAvailability};

use super::utils::load_snapshot;

/// Show which actions are available for one entry.
#[derive(Debug, clap::Args)]
pub struct Actions {
    /// Path to the snapshot file.
    snapshot: PathBuf,
    /// Content identifier of the entry.
    cid: String,
    /// Account to check the actions for.
    #[arg(long)]
    account: Option<String>,
}

impl super::Command for Actions {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let snapshot = load_snapshot(&self.snapshot, ctx.account(self.account.as_deref())).await?;
        let record = snapshot
            .records
            .iter()
            .find(|record| record.cid == self.cid)
            .ok_or_eyre("no such entry in the snapshot")?;
        let entry = project_entry(record, &snapshot.side_data)?;
        let gate = ActionAvailability::of(&entry);
        tracing::debug!(cid = %entry.cid, ?gate, "evaluated action gates");

        let out = ctx.config().output().display_object(serde_json::json!({
            "account": snapshot.side_data.account,
            "cid": entry.cid,
            "upvoteIndex": entry.upvote_index_display,
            "withdrawableBalance": entry.withdrawable_balance.to_string(),
            "canUpvote": gate.can_upvote,
            "canWithdraw": gate.can_withdraw,
        }))?;
        println!("{out}");
        Ok(())
    }
}
