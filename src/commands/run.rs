use std::io::{self, BufReader};
use std::sync::Arc;
use std::sync::mpsc;

use anyhow::Context;
use clap::Args;
use tracing::info;

use super::ConfigArg;
use crate::error::ExitError;
use crate::issues::TrackerClient;
use crate::scheduler::CancelToken;
use crate::session::Session;
use crate::transport::{spawn_reader, ConsoleTransport};

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArg,
}

impl RunArgs {
    /// Run the bot over the stdin/stdout JSON-lines bridge until stdin closes
    /// or a termination signal arrives.
    pub fn execute(&self) -> anyhow::Result<()> {
        let (path, config) = self.config.load()?;
        info!(config = %path.display(), "starting issuebot");

        let transport = Arc::new(ConsoleTransport::stdout());
        let tracker = Arc::new(TrackerClient::new(&config.tracker));
        let session = Session::new(&config, transport.clone(), tracker)
            .map_err(|e| ExitError::Config(e.to_string()))?;
        let session = Arc::new(session);

        let shutdown = CancelToken::new();
        let on_signal = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("received termination signal");
            on_signal.cancel();
        })
        .context("installing signal handler")?;

        transport
            .connect(&config.irc)
            .map_err(|e| ExitError::Transport(e.to_string()))?;

        let (events_tx, events_rx) = mpsc::channel();
        // Detached: a blocking stdin read cannot be interrupted.
        let _reader = spawn_reader(BufReader::new(io::stdin()), events_tx);

        session.run(&events_rx, &shutdown);
        Ok(())
    }
}
