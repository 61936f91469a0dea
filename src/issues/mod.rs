//! Issue-reference pipeline: `#123` in chat → tracker lookup → reply lines.

mod encode;
mod fetch;
mod reference;
mod respond;

use std::sync::Arc;

use tracing::{info, warn};

pub use encode::encode;
pub use fetch::{decode_issue, Assignee, FetchError, IssueRecord, IssueSource, TrackerClient};
pub use reference::{
    extract_references, format_magnitude, parse_reference, ParsedReference, ReferenceError,
    ReferenceMatch,
};
pub use respond::{select_response, Branch, ResponseContext};

use crate::reply::Reply;
use crate::transport::ChatEvent;

/// Turns the issue references in one chat line into replies.
///
/// Every failure is scoped to a single reference: it is logged and the next
/// reference is still processed. Nothing is ever said in the channel about a
/// failed lookup.
pub struct IssuePipeline {
    source: Arc<dyn IssueSource>,
    max_references: usize,
}

impl IssuePipeline {
    pub fn new(source: Arc<dyn IssueSource>, max_references: usize) -> Self {
        Self { source, max_references }
    }

    pub fn respond(&self, event: &ChatEvent, nickname: &str) -> Vec<Reply> {
        let ctx = ResponseContext {
            author: &event.author,
            nickname,
        };

        let mut replies = Vec::new();
        for (index, reference) in extract_references(&event.text).enumerate() {
            if index >= self.max_references {
                warn!(
                    limit = self.max_references,
                    "too many issue references in one message, ignoring the rest"
                );
                break;
            }

            let parsed = match reference.resolve() {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "skipping reference");
                    continue;
                }
            };

            let issue = match self.source.fetch(&parsed.magnitude) {
                Ok(issue) => issue,
                Err(e) => {
                    warn!(number = %parsed.magnitude, error = %e, "issue lookup failed");
                    continue;
                }
            };

            let branch = Branch::select(&parsed, &issue);
            info!(number = %parsed.magnitude, alternate = parsed.is_alternate, ?branch, "issue reference");
            replies.extend(branch.render(&issue, &ctx));
        }
        replies
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory tracker that records every lookup.
    #[derive(Default)]
    pub struct FakeTracker {
        issues: HashMap<String, Result<IssueRecord, FetchError>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTracker {
        pub fn with_issue(mut self, number: &str, title: &str) -> Self {
            let record = IssueRecord {
                number: number.parse().expect("numeric issue number"),
                title: title.to_string(),
                state: "open".to_string(),
                html_url: format!("https://github.com/bolt/bolt/issues/{number}"),
                assignee: None,
            };
            self.issues.insert(number.to_string(), Ok(record));
            self
        }

        pub fn with_error(mut self, number: &str, error: FetchError) -> Self {
            self.issues.insert(number.to_string(), Err(error));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl IssueSource for FakeTracker {
        fn fetch(&self, number: &str) -> Result<IssueRecord, FetchError> {
            self.calls.lock().expect("calls lock").push(number.to_string());
            self.issues
                .get(number)
                .cloned()
                .unwrap_or(Err(FetchError::HttpStatus(404)))
        }
    }
}
