use std::fs;

use crate::config::Config;

/// Initialize config file.
#[derive(Debug, clap::Args)]
pub struct InitConfig {
    /// Overwrite an existing file.
    #[arg(long, short)]
    force: bool,
}

impl super::Command for InitConfig {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let path = ctx.config_path();
        if path.exists() && !self.force {
            eyre::bail!(
                "config file already exists at {}, use `--force` to overwrite it",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&Config::default())?;
        fs::write(path, content)?;
        tracing::info!(path = %path.display(), "initialized config file");
        println!("{}", path.display());
        Ok(())
    }
}
