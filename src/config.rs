use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::reply::ReplyKind;

/// Config file name constants.
pub const CONFIG_TOML: &str = "issuebot.toml";
pub const CONFIG_JSON: &str = "issuebot.json";
pub const CONFIG_ENV: &str = "ISSUEBOT_CONFIG";

/// Find the config file in a directory, preferring issuebot.toml over issuebot.json.
/// Returns None if neither exists.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let toml_path = dir.join(CONFIG_TOML);
    if toml_path.exists() {
        return Some(toml_path);
    }
    let json_path = dir.join(CONFIG_JSON);
    if json_path.exists() {
        return Some(json_path);
    }
    None
}

/// Resolve which config file to load.
///
/// Priority order (highest first):
/// 1. An explicit path (`--config`)
/// 2. `ISSUEBOT_CONFIG`
/// 3. `issuebot.toml` / `issuebot.json` in the working directory
/// 4. `issuebot/config.toml` in the platform config dir (`~/.config` on Linux)
pub fn resolve_config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let cwd = std::env::current_dir().context("could not determine current directory")?;
    if let Some(path) = find_config(&cwd) {
        return Ok(path);
    }

    if let Some(dir) = dirs::config_dir() {
        let user_config = dir.join("issuebot").join("config.toml");
        if user_config.exists() {
            return Ok(user_config);
        }
    }

    Err(ExitError::Config(format!(
        "no {CONFIG_TOML} or {CONFIG_JSON} found in {} and no --config given",
        cwd.display()
    ))
    .into())
}

/// Top-level issuebot config.
///
/// Field names are snake_case; the legacy JSON layout (`github` section,
/// `repos` key) is accepted through aliases.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    pub irc: IrcConfig,
    #[serde(alias = "github")]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

/// Connection settings handed to the chat bridge.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IrcConfig {
    #[serde(default = "default_nickname")]
    pub nickname: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub ssl_verify_skip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackerConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, alias = "repos")]
    pub repo: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_web_base")]
    pub web_base: String,
}

impl TrackerConfig {
    /// Web URL of the tracked repository, e.g. `https://github.com/bolt/bolt`.
    pub fn repo_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.web_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Directory for per-channel log files. Channel logging is off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BotConfig {
    /// Another bot running the same rules; its messages are never answered.
    #[serde(default = "default_guard_nick")]
    pub guard_nick: String,
    /// Most issue lookups made for a single message.
    #[serde(default = "default_max_references")]
    pub max_references: usize,
    /// How long shutdown waits for in-flight handlers.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            guard_nick: default_guard_nick(),
            max_references: default_max_references(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl BotConfig {
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// A user-defined trigger: when `pattern` matches a message, send one of the
/// templates (picked at random). Templates are minijinja and see `author`,
/// `channel` and `nickname`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TriggerConfig {
    pub pattern: String,
    #[serde(default)]
    pub kind: ReplyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<String>,
}

impl TriggerConfig {
    pub fn all_templates(&self) -> Vec<String> {
        self.template
            .iter()
            .chain(self.templates.iter())
            .cloned()
            .collect()
    }
}

// Default value functions for serde
fn default_nickname() -> String { "issuebot".into() }
fn default_port() -> String { "6667".into() }
fn default_quit_message() -> String { "Drop bear spotted… I'm out of here!".into() }
fn default_api_base() -> String { "https://api.github.com".into() }
fn default_web_base() -> String { "https://github.com".into() }
fn default_guard_nick() -> String { "[BoltGitHubBot]".into() }
const fn default_max_references() -> usize { 5 }
const fn default_drain_timeout_secs() -> u64 { 10 }

impl Config {
    /// Load config from a file (TOML or JSON, auto-detected by extension) and validate it.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "toml" => Self::parse_toml(&contents),
            "json" => Self::parse_json(&contents),
            _ => {
                // Try TOML first, then JSON
                Self::parse_toml(&contents).or_else(|_| Self::parse_json(&contents))
            }
        }?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| ExitError::Config(format!("invalid issuebot.toml: {e}")).into())
    }

    /// Parse config from a JSON string.
    pub fn parse_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExitError::Config(format!("invalid issuebot.json: {e}")).into())
    }

    /// Check required fields. Trigger patterns are checked when the trigger
    /// table is built.
    pub fn validate(&self) -> Result<(), ExitError> {
        let required = [
            ("irc.host", &self.irc.host),
            ("irc.nickname", &self.irc.nickname),
            ("tracker.token", &self.tracker.token),
            ("tracker.owner", &self.tracker.owner),
            ("tracker.repo", &self.tracker.repo),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ExitError::Config(format!("{key} is required")));
            }
        }
        if self.bot.max_references == 0 {
            return Err(ExitError::Config("bot.max_references must be at least 1".into()));
        }
        for (index, trigger) in self.triggers.iter().enumerate() {
            if trigger.all_templates().is_empty() {
                return Err(ExitError::Config(format!(
                    "triggers[{index}] ({}) has no template",
                    trigger.pattern
                )));
            }
        }
        Ok(())
    }

    /// A starting config for `issuebot init`.
    pub fn sample() -> Self {
        Self {
            irc: IrcConfig {
                nickname: default_nickname(),
                host: "irc.libera.chat".into(),
                port: "6697".into(),
                ssl: true,
                ssl_verify_skip: false,
                password: None,
                channels: vec!["#bolt".into()],
                quit_message: default_quit_message(),
            },
            tracker: TrackerConfig {
                token: "changeme".into(),
                owner: "bolt".into(),
                repo: "bolt".into(),
                api_base: default_api_base(),
                web_base: default_web_base(),
            },
            logging: LoggingConfig {
                location: Some(PathBuf::from("logs")),
            },
            bot: BotConfig::default(),
            triggers: vec![TriggerConfig {
                pattern: "#soup".into(),
                kind: ReplyKind::Action,
                template: Some("pours {{ author }} a nice warm bowl of soup".into()),
                templates: Vec::new(),
            }],
        }
    }

    /// Serialize config to a TOML string with helpful comments.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        let raw = toml::to_string_pretty(self).context("serializing config to TOML")?;

        // Use toml_edit to add comments before each section
        let mut doc: toml_edit::DocumentMut = raw
            .parse()
            .context("parsing generated TOML for comment injection")?;

        doc.decor_mut().set_prefix("# issuebot configuration\n\n");

        fn set_table_comment(doc: &mut toml_edit::DocumentMut, key: &str, comment: &str) {
            if let Some(item) = doc.get_mut(key)
                && let Some(tbl) = item.as_table_mut()
            {
                tbl.decor_mut().set_prefix(comment);
            }
        }

        set_table_comment(&mut doc, "irc", "# Chat connection, passed to the bridge on startup\n");
        set_table_comment(&mut doc, "tracker", "\n# Issue tracker used for #123 lookups\n");
        set_table_comment(&mut doc, "logging", "\n# Per-channel conversation logs\n");
        set_table_comment(&mut doc, "bot", "\n# Loop guard and lookup limits\n");

        Ok(doc.to_string())
    }
}
