use std::{path::PathBuf, sync::Arc, time::Duration};

use time::OffsetDateTime;
use vidrank_sdk::{
    metadata::{MetadataFetcher, YoutubeMetadataService},
    project,
    rust_decimal::{Decimal, RoundingStrategy},
    ActionAvailability, MetadataCache, RankedEntry, ServiceType, SortDirection,
    SortField, SortSpec,
};

use crate::config::{Config, DisplayOptions};

use super::utils::{load_snapshot, submitted_ago};

const EMPTY_MESSAGE: &str = "The leaderboard is currently empty.";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Project a leaderboard snapshot and display it.
#[derive(Debug, clap::Args)]
pub struct Show {
    /// Path to the snapshot file.
    snapshot: PathBuf,
    /// Account to project the leaderboard for.
    #[arg(long)]
    account: Option<String>,
    /// Field to sort by.
    #[arg(long, short)]
    sort: Option<SortField>,
    /// Sort direction.
    #[arg(long, short)]
    direction: Option<SortDirection>,
    /// Service type to show.
    #[arg(long)]
    service_type: Option<ServiceType>,
    /// Resolve video titles before rendering.
    #[arg(long)]
    fetch_titles: bool,
}

impl super::Command for Show {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let config = ctx.config();
        let snapshot = load_snapshot(&self.snapshot, ctx.account(self.account.as_deref())).await?;

        let default_spec = config.sort_spec();
        let spec = SortSpec::new(
            self.sort.unwrap_or(default_spec.field),
            self.direction.unwrap_or(default_spec.direction),
        );
        let filter = self
            .service_type
            .clone()
            .unwrap_or_else(|| config.service_type.clone());

        let entries = project(&snapshot, &spec, &filter)?;
        tracing::debug!(
            account = %snapshot.side_data.account,
            %filter,
            field = %spec.field,
            direction = %spec.direction,
            entries = entries.len(),
            "projected leaderboard"
        );

        let cache = if self.fetch_titles && filter == ServiceType::Youtube {
            Some(fetch_titles(&entries, config).await?)
        } else {
            if self.fetch_titles {
                tracing::warn!(%filter, "titles are only available for YouTube videos");
            }
            None
        };

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let rows = entries.iter().map(|entry| {
            let title = cache
                .as_ref()
                .and_then(|cache| cache.title(&entry.service_specific_id));
            row(entry, title, now)
        });

        let out = config.output().display_many(
            rows,
            DisplayOptions::table_projection([
                ("rank", "#"),
                ("title", "Title"),
                ("serviceSpecificID", "Video"),
                ("submitted", "Submitted"),
                ("allTimeUpvotes", "Upvotes"),
                ("upvoteIndex", "Upvoted"),
                ("withdrawableBalance", "Balance"),
                ("actions", "Actions"),
            ])
            .empty_message(EMPTY_MESSAGE),
        )?;
        println!("{out}");
        Ok(())
    }
}

fn row(entry: &RankedEntry, title: Option<String>, now: i64) -> serde_json::Value {
    let gate = ActionAvailability::of(entry);
    let actions = [("upvote", gate.can_upvote), ("withdraw", gate.can_withdraw)]
        .into_iter()
        .filter_map(|(name, open)| open.then_some(name))
        .collect::<Vec<_>>()
        .join(", ");
    serde_json::json!({
        "rank": format!("#{}", entry.rank + 1),
        "title": title,
        "cid": entry.cid,
        "serviceType": entry.service_type,
        "serviceSpecificID": entry.service_specific_id,
        "url": entry.service_type.watch_url(&entry.service_specific_id),
        "score": entry.score.to_string(),
        "submitted": submitted_ago(entry.proposal_timestamp, now),
        "proposalTimestamp": entry.proposal_timestamp,
        "submittedInBlock": entry.submitted_in_block,
        "allTimeUpvotes": entry.all_time_upvotes,
        "numUpvoters": entry.num_upvoters,
        "upvoteIndex": entry.upvote_index_display,
        "withdrawableBalance": format_balance(entry.withdrawable_balance),
        "canUpvote": gate.can_upvote,
        "canWithdraw": gate.can_withdraw,
        "actions": actions,
    })
}

fn format_balance(balance: Decimal) -> String {
    let rounded = balance.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Request the title of every entry and wait until all requests settle or
/// the configured wait elapses.
async fn fetch_titles(entries: &[RankedEntry], config: &Config) -> eyre::Result<Arc<MetadataCache>> {
    let cache = Arc::new(MetadataCache::new());
    let service = YoutubeMetadataService::try_new(&config.metadata.endpoint)?;
    let fetcher = MetadataFetcher::spawning(service, cache.clone())?;
    let issued = fetcher.ensure_fetched_all(entries);
    tracing::info!(issued, "requested titles");

    let wait = config.metadata_wait();
    let settled = tokio::time::timeout(wait, async {
        while !cache.is_settled() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await;
    if settled.is_err() {
        tracing::warn!(
            pending = cache.num_pending(),
            "stopped waiting for titles after {}",
            humantime::format_duration(wait)
        );
    }
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use vidrank_sdk::ProjectedEntry;

    use super::*;

    fn entry(upvote_index: &str, balance: Decimal) -> RankedEntry {
        RankedEntry {
            entry: ProjectedEntry {
                cid: "yt:abc".into(),
                service_type: ServiceType::Youtube,
                service_specific_id: "abc".into(),
                score: 12.5,
                all_time_upvotes: 3,
                num_upvoters: 2,
                has_upvoted: upvote_index != "-",
                upvote_index_display: upvote_index.into(),
                withdrawable_balance: balance,
                submitted_in_block: 10,
                proposal_timestamp: 1_000,
            },
            rank: 0,
        }
    }

    #[test]
    fn renders_row() {
        let row = row(&entry("-", Decimal::new(12345, 3)), Some("t".into()), 1_060);
        assert_eq!(row["rank"], "#1");
        assert_eq!(row["title"], "t");
        assert_eq!(row["submitted"], "Submitted 1 minute ago");
        assert_eq!(row["withdrawableBalance"], "12.35");
        assert_eq!(row["actions"], "upvote, withdraw");
        assert_eq!(row["url"], "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn closed_gates() {
        let row = row(&entry("2", Decimal::ZERO), None, 1_000);
        assert_eq!(row["upvoteIndex"], "2");
        assert_eq!(row["withdrawableBalance"], "0.00");
        assert_eq!(row["actions"], "");
        assert!(row["title"].is_null());
    }
}
