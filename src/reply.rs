use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How an outbound line is presented in the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Notice,
    #[default]
    Action,
    Message,
}

impl ReplyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::Action => "action",
            Self::Message => "message",
        }
    }
}

/// A line the bot wants to send back to the channel an event came from.
///
/// `delay` is `None` for immediate replies; delayed replies are handed to the
/// session scheduler and dropped if the session shuts down first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn notice(text: impl Into<String>) -> Self {
        Self { kind: ReplyKind::Notice, text: text.into(), delay: None }
    }

    pub fn action(text: impl Into<String>) -> Self {
        Self { kind: ReplyKind::Action, text: text.into(), delay: None }
    }

    pub fn new(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into(), delay: None }
    }

    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}
