use std::path::Path;

use actions::Actions;
use enum_dispatch::enum_dispatch;
use init_config::InitConfig;
use parse_cid::ParseCid;
use show::Show;

use crate::config::Config;

mod actions;
mod init_config;
mod parse_cid;
mod show;

/// Utils for command implementations.
pub mod utils;

/// Commands.
#[enum_dispatch(Command)]
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Initialize config file.
    InitConfig(InitConfig),
    /// Project a leaderboard snapshot and display it.
    Show(Show),
    /// Decode a content identifier.
    ParseCid(ParseCid),
    /// Show which actions are available for one entry.
    Actions(Actions),
}

#[enum_dispatch]
pub(crate) trait Command {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()>;
}

pub(crate) struct Context<'a> {
    config_path: &'a Path,
    config: &'a Config,
    _verbose: bool,
}

impl<'a> Context<'a> {
    pub(super) fn new(config_path: &'a Path, config: &'a Config, verbose: bool) -> Self {
        Self {
            config_path,
            config,
            _verbose: verbose,
        }
    }

    pub(crate) fn config(&self) -> &Config {
        self.config
    }

    pub(crate) fn config_path(&self) -> &Path {
        self.config_path
    }

    /// Account given on the command line, falling back to the config.
    pub(crate) fn account<'b>(&'b self, account: Option<&'b str>) -> Option<&'b str> {
        account.or(self.config.account())
    }
}
