pub mod check;
pub mod init;
pub mod run;
pub mod schema;

use std::path::PathBuf;

use clap::Args;

use crate::config::{self, Config};

/// `--config` shared by the commands that read a config file.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArg {
    /// Path to issuebot.toml or issuebot.json
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ConfigArg {
    pub fn path(&self) -> anyhow::Result<PathBuf> {
        config::resolve_config_path(self.config.as_deref())
    }

    /// Resolve, load and validate the config.
    pub fn load(&self) -> anyhow::Result<(PathBuf, Config)> {
        let path = self.path()?;
        let config = Config::load(&path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok((path, config))
    }
}
