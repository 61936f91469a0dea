use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::config::{CONFIG_TOML, Config};
use crate::error::ExitError;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Where to write the sample config
    #[arg(long, default_value = CONFIG_TOML)]
    pub output: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        write_sample(&self.output, self.force)?;
        println!("wrote {}", self.output.display());
        println!("edit irc.host and tracker.token, then run `issuebot check`");
        Ok(())
    }
}

fn write_sample(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        return Err(ExitError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    let contents = Config::sample().to_toml()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote sample config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_TOML);
        write_sample(&path, false).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.irc.nickname, "issuebot");
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_TOML);
        fs::write(&path, "keep me").unwrap();

        let err = write_sample(&path, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

        write_sample(&path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("# issuebot configuration"));
    }
}
