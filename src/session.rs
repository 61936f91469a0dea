//! One connected bot: routes transport events to the issue pipeline, the
//! trigger table and karma, and owns everything that lives as long as the
//! connection (roster, channel logs, deferred replies).

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, info_span, warn};

use crate::channel_log::ChannelLogs;
use crate::config::Config;
use crate::guard::AntiLoopGuard;
use crate::issues::{IssuePipeline, IssueSource};
use crate::karma::Karma;
use crate::reply::Reply;
use crate::scheduler::{CancelToken, InFlight, Scheduler};
use crate::transport::{ChatEvent, Transport, TransportEvent};
use crate::triggers::{TriggerError, TriggerTable};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct Session {
    nickname: String,
    channels: Vec<String>,
    quit_message: String,
    drain_timeout: Duration,
    transport: Arc<dyn Transport>,
    guard: AntiLoopGuard,
    pipeline: IssuePipeline,
    triggers: TriggerTable,
    karma: Karma,
    logs: ChannelLogs,
    roster: Mutex<HashMap<String, Vec<String>>>,
    scheduler: Scheduler,
    in_flight: InFlight,
}

impl Session {
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        source: Arc<dyn IssueSource>,
    ) -> Result<Self, TriggerError> {
        Ok(Self {
            nickname: config.irc.nickname.clone(),
            channels: config.irc.channels.clone(),
            quit_message: config.irc.quit_message.clone(),
            drain_timeout: config.bot.drain_timeout(),
            transport,
            guard: AntiLoopGuard::new(&config.bot.guard_nick, &config.irc.nickname),
            pipeline: IssuePipeline::new(source, config.bot.max_references),
            triggers: TriggerTable::new(&config.triggers)?,
            karma: Karma::new(),
            logs: ChannelLogs::new(config.logging.location.clone()),
            roster: Mutex::new(HashMap::new()),
            scheduler: Scheduler::new(),
            in_flight: InFlight::new(),
        })
    }

    /// Process events until the transport disconnects or `shutdown` is
    /// cancelled, then shut down.
    pub fn run(self: &Arc<Self>, events: &Receiver<TransportEvent>, shutdown: &CancelToken) {
        info!(nickname = %self.nickname, channels = ?self.channels, "session started");
        match self.logs.dir() {
            Some(dir) => info!(dir = %dir.display(), "channel logs enabled"),
            None => debug!("channel logs disabled"),
        }
        loop {
            if shutdown.is_cancelled() {
                info!("shutdown requested");
                break;
            }
            match events.recv_timeout(POLL_INTERVAL) {
                Ok(TransportEvent::Disconnected) | Err(RecvTimeoutError::Disconnected) => {
                    info!("transport disconnected");
                    break;
                }
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        self.shutdown();
    }

    /// Welcome and names are handled inline; each message gets its own thread.
    pub fn handle_event(self: &Arc<Self>, event: TransportEvent) {
        match event {
            TransportEvent::Welcome => self.on_welcome(),
            TransportEvent::Names { channel, names } => self.set_roster(&channel, &names),
            TransportEvent::Privmsg(chat) => {
                let session = Arc::clone(self);
                let ticket = self.in_flight.ticket();
                thread::spawn(move || {
                    let _ticket = ticket;
                    session.handle_privmsg(&chat);
                });
            }
            TransportEvent::Disconnected => {}
        }
    }

    fn on_welcome(&self) {
        for channel in &self.channels {
            if let Err(e) = self.transport.join(channel) {
                warn!(%channel, error = %e, "join failed");
                continue;
            }
            info!(%channel, "joined");
            if let Err(e) = self.logs.open(channel) {
                warn!(%channel, error = %e, "channel log unavailable");
            }
        }
    }

    /// Replace the roster for `channel` with a names reply, dropping chanop markers.
    pub fn set_roster(&self, channel: &str, names: &str) {
        let nicks: Vec<String> = names
            .replace('@', "")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        debug!(%channel, count = nicks.len(), "roster updated");
        self.roster
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel.to_string(), nicks);
    }

    #[cfg(test)]
    pub(crate) fn roster(&self, channel: &str) -> Vec<String> {
        self.roster
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    pub fn handle_privmsg(&self, event: &ChatEvent) {
        let _span =
            info_span!("message", channel = %event.channel, author = %event.author).entered();

        if event.is_channel() {
            self.logs.write(&event.channel, &event.author, &event.text);
        }

        if self.guard.is_guarded(&event.author) {
            debug!("ignoring guarded author");
            return;
        }

        let mut replies = self.pipeline.respond(event, &self.nickname);
        replies.extend(self.triggers.respond(event, &self.nickname));
        replies.extend(self.karma.handle(event));
        self.deliver(event.reply_target(), replies);
    }

    fn deliver(&self, target: &str, replies: Vec<Reply>) {
        for reply in replies {
            match reply.delay {
                None => send(self.transport.as_ref(), target, &reply),
                Some(delay) => {
                    let transport = Arc::clone(&self.transport);
                    let target = target.to_string();
                    self.scheduler
                        .schedule(delay, move || send(transport.as_ref(), &target, &reply));
                }
            }
        }
    }

    /// Cancel deferred replies, wait for running handlers, then quit.
    pub fn shutdown(&self) {
        let pending = self.scheduler.pending();
        self.scheduler.cancel_all();
        if pending > 0 {
            info!(pending, "cancelled deferred replies");
        }

        let running = self.in_flight.count();
        if running > 0 {
            info!(running, timeout = ?self.drain_timeout, "waiting for handlers");
        }
        let remaining = self.in_flight.drain(self.drain_timeout);
        if remaining > 0 {
            warn!(remaining, timeout = ?self.drain_timeout, "handlers still running at shutdown");
        }

        if let Err(e) = self.transport.quit(&self.quit_message) {
            warn!(error = %e, "sending quit failed");
        }
        info!("session stopped");
    }
}

fn send(transport: &dyn Transport, target: &str, reply: &Reply) {
    if let Err(e) = transport.send(target, reply.kind, &reply.text) {
        warn!(%target, kind = reply.kind.as_str(), error = %e, "send failed");
    }
}
