//! Chat transport seam: inbound events in, notices/actions/messages out.

mod console;

use std::io;

pub use console::{spawn_reader, ConsoleTransport, InboundLine, OutboundLine};

use crate::reply::ReplyKind;

/// One PRIVMSG-class line as seen by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub author: String,
    /// Channel name, or the bot's nick for a private message.
    pub channel: String,
    pub text: String,
}

impl ChatEvent {
    pub fn is_channel(&self) -> bool {
        self.channel.starts_with('#') || self.channel.starts_with('&')
    }

    /// Where replies go: the channel, or the author for private messages.
    pub fn reply_target(&self) -> &str {
        if self.is_channel() { &self.channel } else { &self.author }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Registration finished; channels can be joined.
    Welcome,
    Privmsg(ChatEvent),
    /// Names reply for a channel, space separated, chanops prefixed with `@`.
    Names { channel: String, names: String },
    Disconnected,
}

/// Outbound half of a chat connection.
pub trait Transport: Send + Sync {
    fn join(&self, channel: &str) -> io::Result<()>;

    fn send(&self, target: &str, kind: ReplyKind, text: &str) -> io::Result<()>;

    fn quit(&self, message: &str) -> io::Result<()>;
}


#[cfg(test)]
mod tests {
    use super::*;

    fn event(channel: &str) -> ChatEvent {
        ChatEvent {
            author: "alice".into(),
            channel: channel.into(),
            text: "hi".into(),
        }
    }

    #[test]
    fn channel_replies_go_to_channel() {
        assert_eq!(event("#bolt").reply_target(), "#bolt");
        assert_eq!(event("&local").reply_target(), "&local");
    }

    #[test]
    fn private_replies_go_to_author() {
        let private = event("issuebot");
        assert!(!private.is_channel());
        assert_eq!(private.reply_target(), "alice");
    }
}
