use std::time::Duration;

use crate::reply::Reply;

use super::encode::encode;
use super::fetch::IssueRecord;
use super::reference::ParsedReference;

/// The number nobody mentions.
const CURSED: f64 = 1555.0;

/// The easter eggs always point at the upstream Bolt tracker.
const BOLT_ISSUES: &str = "https://github.com/bolt/bolt/issues";

const RULE_ONE_DELAY: Duration = Duration::from_secs(5);
const SUSPICIOUS_DELAY: Duration = Duration::from_secs(2);

/// Per-message values that replies may mention.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    /// Nick of whoever wrote the message.
    pub author: &'a str,
    /// The bot's own nick.
    pub nickname: &'a str,
}

/// Which reply template a resolved reference gets. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// `#-1`
    LinguaFranca,
    /// `#-1555`
    TemptTheGods,
    /// Alternate mode on a multiple of 1555.
    ItDo,
    /// Any other alternate-mode reference.
    Rovarsprak,
    /// Issue #1.
    RuleNumberOne,
    /// Issue #1555.
    EndOfTheUniverse,
    Standard,
}

impl Branch {
    /// First match wins. Number checks use the fetched issue number, not the
    /// number that was typed.
    pub fn select(reference: &ParsedReference, issue: &IssueRecord) -> Self {
        if reference.is_alternate {
            if reference.is_value(-1.0) {
                Self::LinguaFranca
            } else if reference.is_value(-CURSED) {
                Self::TemptTheGods
            } else if issue.number_is_multiple_of(CURSED) {
                Self::ItDo
            } else {
                Self::Rovarsprak
            }
        } else if issue.number_is(1.0) {
            Self::RuleNumberOne
        } else if issue.number_is(CURSED) {
            Self::EndOfTheUniverse
        } else {
            Self::Standard
        }
    }

    pub fn render(self, issue: &IssueRecord, ctx: &ResponseContext<'_>) -> Vec<Reply> {
        let number = issue.number;
        match self {
            Self::LinguaFranca => vec![Reply::notice(format!(
                "#{number} Add locale ´Rövarspråket´ as default, since it is the new Lingua Franca of the internet. {BOLT_ISSUES}/1"
            ))],
            Self::TemptTheGods => vec![Reply::notice(format!(
                "Do not tempt the gods, {}.",
                ctx.author
            ))],
            Self::ItDo => vec![Reply::notice(format!(
                "#{number} They don't think it be like it is but it do. {BOLT_ISSUES}/{number}"
            ))],
            Self::Rovarsprak => vec![Reply::notice(format!(
                "#{number} {} {}",
                encode(&issue.title),
                issue.html_url
            ))],
            Self::RuleNumberOne => vec![
                Reply::notice(format!(
                    "#1 Port Bolt to Go to keep {} happy {BOLT_ISSUES}/1",
                    ctx.nickname
                )),
                Reply::action("is written in Go, and therefore isn't allowed to like PHP")
                    .after(RULE_ONE_DELAY),
            ],
            Self::EndOfTheUniverse => vec![Reply::action(format!(
                "warns {} that #1555 nearly caused the end of the known universe and should never be mentioned again",
                ctx.author
            ))],
            Self::Standard => {
                let assigned = issue
                    .assignee_login()
                    .map(|login| format!(" — assigned to {login}"))
                    .unwrap_or_default();
                let mut replies = vec![Reply::notice(format!(
                    "#{number} [{}] {} {}{assigned}",
                    issue.state, issue.title, issue.html_url
                ))];
                if issue.number_is_multiple_of(CURSED) {
                    replies.push(
                        Reply::action("looks at that number suspiciously…").after(SUSPICIOUS_DELAY),
                    );
                }
                replies
            }
        }
    }
}

/// Pick and render the reply for one resolved reference.
pub fn select_response(
    reference: &ParsedReference,
    issue: &IssueRecord,
    ctx: &ResponseContext<'_>,
) -> Vec<Reply> {
    Branch::select(reference, issue).render(issue, ctx)
}
