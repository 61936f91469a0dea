use std::io::IsTerminal;

use clap::Args;
use serde::Serialize;

use super::ConfigArg;
use crate::config::Config;
use crate::error::ExitError;
use crate::issues::{FetchError, IssueSource, TrackerClient};
use crate::triggers::TriggerTable;

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArg,
    /// Also fetch issue #1 to verify the tracker token and repository
    #[arg(long)]
    pub probe: bool,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub config_path: String,
    pub nickname: String,
    pub server: String,
    pub channels: Vec<String>,
    pub repository: String,
    pub triggers: usize,
    pub channel_logs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeStatus>,
}

#[derive(Debug, Serialize)]
pub struct ProbeStatus {
    pub ok: bool,
    pub detail: String,
}

impl CheckArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let (path, config) = self.config.load()?;
        let triggers = TriggerTable::new(&config.triggers)
            .map_err(|e| ExitError::Config(e.to_string()))?;

        let probe = self.probe.then(|| probe(&TrackerClient::new(&config.tracker)));
        let report = build_report(&path.display().to_string(), &config, triggers.len(), probe);

        let format = self.format.unwrap_or_else(|| {
            if std::io::stdout().is_terminal() {
                OutputFormat::Pretty
            } else {
                OutputFormat::Text
            }
        });
        match format {
            OutputFormat::Pretty => print_pretty(&report),
            OutputFormat::Text => print_text(&report),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }

        if let Some(probe) = &report.probe
            && !probe.ok
        {
            return Err(ExitError::Probe(probe.detail.clone()).into());
        }
        Ok(())
    }
}

fn build_report(
    config_path: &str,
    config: &Config,
    triggers: usize,
    probe: Option<ProbeStatus>,
) -> CheckReport {
    CheckReport {
        config_path: config_path.to_string(),
        nickname: config.irc.nickname.clone(),
        server: format!(
            "{}:{}{}",
            config.irc.host,
            config.irc.port,
            if config.irc.ssl { " (tls)" } else { "" }
        ),
        channels: config.irc.channels.clone(),
        repository: config.tracker.repo_url(),
        triggers,
        channel_logs: config
            .logging
            .location
            .as_ref()
            .map(|p| p.display().to_string()),
        probe,
    }
}

/// A missing issue #1 still proves the token and repository are usable.
fn probe(source: &dyn IssueSource) -> ProbeStatus {
    match source.fetch("1") {
        Ok(issue) => ProbeStatus {
            ok: true,
            detail: format!("fetched #{} ({})", issue.number, issue.state),
        },
        Err(FetchError::HttpStatus(404)) => ProbeStatus {
            ok: true,
            detail: "tracker reachable, issue #1 not found".to_string(),
        },
        Err(e) => ProbeStatus { ok: false, detail: e.to_string() },
    }
}

fn print_pretty(report: &CheckReport) {
    println!("=== issuebot check ===\n");
    println!("Config:     {}", report.config_path);
    println!("Nickname:   {}", report.nickname);
    println!("Server:     {}", report.server);
    println!("Channels:   {}", report.channels.join(", "));
    println!("Repository: {}", report.repository);
    println!("Triggers:   {}", report.triggers);
    println!(
        "Logs:       {}",
        report.channel_logs.as_deref().unwrap_or("disabled")
    );
    if let Some(probe) = &report.probe {
        let mark = if probe.ok { "✓" } else { "✗" };
        println!("\n{mark} tracker: {}", probe.detail);
    } else {
        println!("\n✓ config is valid");
    }
}

fn print_text(report: &CheckReport) {
    println!(
        "issuebot-check  config={}  nickname={}  server={}",
        report.config_path, report.nickname, report.server
    );
    println!("channels  {}", report.channels.join(" "));
    println!("repository  {}", report.repository);
    println!("triggers  {}", report.triggers);
    println!(
        "logs  {}",
        report.channel_logs.as_deref().unwrap_or("disabled")
    );
    if let Some(probe) = &report.probe {
        let status = if probe.ok { "ok" } else { "failed" };
        println!("probe  {status}  {}", probe.detail);
    }
}
