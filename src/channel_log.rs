use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use chrono::{DateTime, Local};
use tracing::warn;

/// Append-only conversation logs, one file per joined channel.
///
/// With no directory configured every call is a no-op.
pub struct ChannelLogs {
    dir: Option<PathBuf>,
    files: Mutex<HashMap<String, File>>,
}

impl ChannelLogs {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir: dir.filter(|d| !d.as_os_str().is_empty()),
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Log file for a channel. `/` and `\` in the name are replaced so the
    /// file always lands directly in the log directory.
    pub fn log_path(dir: &Path, channel: &str) -> PathBuf {
        let name: String = channel
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        dir.join(format!("{name}.log"))
    }

    /// Open (or create) the log file for `channel`.
    pub fn open(&self, channel: &str) -> anyhow::Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
        let path = Self::log_path(dir, channel);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel.to_string(), file);
        Ok(())
    }

    /// Append one chat line. Channels that were never opened are skipped.
    pub fn write(&self, channel: &str, author: &str, text: &str) {
        self.write_at(Local::now(), channel, author, text);
    }

    fn write_at(&self, at: DateTime<Local>, channel: &str, author: &str, text: &str) {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(file) = files.get_mut(channel) else {
            return;
        };
        if let Err(e) = writeln!(file, "{}", format_line(at, author, text)) {
            warn!(channel, error = %e, "writing channel log failed");
        }
    }
}

/// `[YYYY-MM-DD HH:MM:SS] <author> text`
pub fn format_line(at: DateTime<Local>, author: &str, text: &str) -> String {
    format!("[{}] <{author}> {text}", at.format("%Y-%m-%d %H:%M:%S"))
}
