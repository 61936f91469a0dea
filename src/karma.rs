use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::reply::Reply;
use crate::transport::ChatEvent;

const QUERY_PREFIX: &str = "!karma";

/// In-memory karma counters keyed by lowercased word.
#[derive(Default)]
pub struct Karma {
    scores: Mutex<HashMap<String, i64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Up,
    Down,
}

/// Split a token like `rust++,` into `("rust", Vote::Up)`.
fn parse_vote(token: &str) -> Option<(&str, Vote)> {
    let token = token.trim_end_matches(|c: char| matches!(c, ',' | '.' | '!' | '?' | ';' | ':'));
    let (word, vote) = if let Some(word) = token.strip_suffix("++") {
        (word, Vote::Up)
    } else if let Some(word) = token.strip_suffix("--") {
        (word, Vote::Down)
    } else {
        return None;
    };
    if word.is_empty() || word.ends_with(['+', '-']) {
        return None;
    }
    Some((word, vote))
}

impl Karma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self, word: &str) -> i64 {
        self.scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Apply every `word++` / `word--` in the message and answer `!karma word`.
    /// Votes for the author's own nick are ignored.
    pub fn handle(&self, event: &ChatEvent) -> Vec<Reply> {
        let text = event.text.trim();
        if let Some(rest) = text.strip_prefix(QUERY_PREFIX) {
            if let Some(word) = rest.split_whitespace().next()
                && rest.starts_with(char::is_whitespace)
            {
                return vec![Reply::notice(format!("{word} has karma {}", self.score(word)))];
            }
            return Vec::new();
        }

        let mut scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        for (word, vote) in text.split_whitespace().filter_map(parse_vote) {
            if word.eq_ignore_ascii_case(&event.author) {
                debug!(author = %event.author, "ignoring self karma");
                continue;
            }
            let entry = scores.entry(word.to_lowercase()).or_insert(0);
            match vote {
                Vote::Up => *entry += 1,
                Vote::Down => *entry -= 1,
            }
        }
        Vec::new()
    }
}
