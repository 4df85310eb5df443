use vidrank_sdk::{cid::encode_cid, parse_cid};

/// Decode a content identifier.
#[derive(Debug, clap::Args)]
pub struct ParseCid {
    /// The identifier, plain (`yt:<id>`) or hex encoded.
    cid: String,
}

impl super::Command for ParseCid {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let (service_type, id) = parse_cid(&self.cid)?;
        let out = ctx.config().output().display_object(serde_json::json!({
            "serviceType": service_type,
            "serviceSpecificID": id,
            "url": service_type.watch_url(&id),
            "encoded": encode_cid(&service_type, &id),
        }))?;
        println!("{out}");
        Ok(())
    }
}
