use std::io::{self, BufRead, Write};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChatEvent, Transport, TransportEvent};
use crate::config::IrcConfig;
use crate::reply::ReplyKind;

/// One line read from the chat bridge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundLine {
    Welcome,
    Privmsg {
        channel: String,
        author: String,
        text: String,
    },
    Names {
        channel: String,
        names: String,
    },
}

impl From<InboundLine> for TransportEvent {
    fn from(line: InboundLine) -> Self {
        match line {
            InboundLine::Welcome => Self::Welcome,
            InboundLine::Privmsg { channel, author, text } => {
                Self::Privmsg(ChatEvent { author, channel, text })
            }
            InboundLine::Names { channel, names } => Self::Names { channel, names },
        }
    }
}

/// One line written to the chat bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundLine<'a> {
    Connect {
        host: &'a str,
        port: &'a str,
        ssl: bool,
        ssl_verify_skip: bool,
        nickname: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<&'a str>,
    },
    Join {
        channel: &'a str,
    },
    Notice {
        target: &'a str,
        text: &'a str,
    },
    Action {
        target: &'a str,
        text: &'a str,
    },
    Message {
        target: &'a str,
        text: &'a str,
    },
    Quit {
        message: &'a str,
    },
}

/// JSON-lines transport: outbound lines are written to `W` (stdout in
/// production), inbound lines come from [`spawn_reader`].
pub struct ConsoleTransport<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleTransport<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleTransport<W> {
    pub const fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Ask the bridge to open the connection described by `irc`.
    pub fn connect(&self, irc: &IrcConfig) -> io::Result<()> {
        self.write_line(&OutboundLine::Connect {
            host: &irc.host,
            port: &irc.port,
            ssl: irc.ssl,
            ssl_verify_skip: irc.ssl_verify_skip,
            nickname: &irc.nickname,
            password: irc.password.as_deref().filter(|p| !p.is_empty()),
        })
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_line(&self, line: &OutboundLine<'_>) -> io::Result<()> {
        let json = serde_json::to_string(line).map_err(io::Error::other)?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("transport writer lock poisoned"))?;
        writeln!(out, "{json}")?;
        out.flush()
    }
}

impl<W: Write + Send> Transport for ConsoleTransport<W> {
    fn join(&self, channel: &str) -> io::Result<()> {
        self.write_line(&OutboundLine::Join { channel })
    }

    fn send(&self, target: &str, kind: ReplyKind, text: &str) -> io::Result<()> {
        let line = match kind {
            ReplyKind::Notice => OutboundLine::Notice { target, text },
            ReplyKind::Action => OutboundLine::Action { target, text },
            ReplyKind::Message => OutboundLine::Message { target, text },
        };
        self.write_line(&line)
    }

    fn quit(&self, message: &str) -> io::Result<()> {
        self.write_line(&OutboundLine::Quit { message })
    }
}

/// Read JSON lines from `reader` on a background thread and forward them as
/// [`TransportEvent`]s. Unparseable lines are logged and skipped; end of input
/// or a read error sends [`TransportEvent::Disconnected`].
pub fn spawn_reader<R>(reader: R, events: Sender<TransportEvent>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "reading from chat bridge failed");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<InboundLine>(trimmed) {
                Ok(inbound) => {
                    debug!(?inbound, "inbound");
                    if events.send(inbound.into()).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(error = %e, line = trimmed, "ignoring unparseable inbound line"),
            }
        }
        let _ = events.send(TransportEvent::Disconnected);
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::mpsc;

    use super::*;

    fn written(transport: ConsoleTransport<Vec<u8>>) -> Vec<serde_json::Value> {
        String::from_utf8(transport.into_inner())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn irc() -> IrcConfig {
        IrcConfig {
            nickname: "issuebot".into(),
            host: "irc.example.org".into(),
            port: "6697".into(),
            ssl: true,
            ssl_verify_skip: false,
            password: Some(String::new()),
            channels: vec!["#bolt".into()],
            quit_message: "bye".into(),
        }
    }

    #[test]
    fn outbound_lines_are_tagged_json() {
        let transport = ConsoleTransport::new(Vec::new());
        transport.join("#bolt").unwrap();
        transport.send("#bolt", ReplyKind::Notice, "#42 [open] Title url").unwrap();
        transport.send("#bolt", ReplyKind::Action, "waves").unwrap();
        transport.send("alice", ReplyKind::Message, "hi").unwrap();
        transport.quit("bye").unwrap();

        let lines = written(transport);
        assert_eq!(lines[0], serde_json::json!({"type": "join", "channel": "#bolt"}));
        assert_eq!(
            lines[1],
            serde_json::json!({"type": "notice", "target": "#bolt", "text": "#42 [open] Title url"})
        );
        assert_eq!(lines[2]["type"], "action");
        assert_eq!(lines[3]["type"], "message");
        assert_eq!(lines[3]["target"], "alice");
        assert_eq!(lines[4], serde_json::json!({"type": "quit", "message": "bye"}));
    }

    #[test]
    fn connect_line_omits_empty_password() {
        let transport = ConsoleTransport::new(Vec::new());
        transport.connect(&irc()).unwrap();
        let lines = written(transport);
        assert_eq!(lines[0]["type"], "connect");
        assert_eq!(lines[0]["host"], "irc.example.org");
        assert_eq!(lines[0]["ssl"], true);
        assert!(lines[0].get("password").is_none());
    }

    #[test]
    fn reader_forwards_events_and_reports_disconnect() {
        let input = concat!(
            "{\"type\":\"welcome\"}\n",
            "\n",
            "not json\n",
            "{\"type\":\"unknown\"}\n",
            "{\"type\":\"names\",\"channel\":\"#bolt\",\"names\":\"@bob alice\"}\n",
            "{\"type\":\"privmsg\",\"channel\":\"#bolt\",\"author\":\"alice\",\"text\":\"#42\"}\n",
        );
        let (tx, rx) = mpsc::channel();
        spawn_reader(Cursor::new(input.as_bytes().to_vec()), tx).join().unwrap();

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                TransportEvent::Welcome,
                TransportEvent::Names {
                    channel: "#bolt".into(),
                    names: "@bob alice".into(),
                },
                TransportEvent::Privmsg(ChatEvent {
                    author: "alice".into(),
                    channel: "#bolt".into(),
                    text: "#42".into(),
                }),
                TransportEvent::Disconnected,
            ]
        );
    }
}
