/// Drops messages from bots that would answer us back.
///
/// Matching is exact and case-sensitive, like nick comparison on the wire.
#[derive(Debug, Clone)]
pub struct AntiLoopGuard {
    guarded: Vec<String>,
}

impl AntiLoopGuard {
    pub fn new(guard_nick: &str, own_nick: &str) -> Self {
        let guarded = [guard_nick, own_nick]
            .into_iter()
            .filter(|nick| !nick.is_empty())
            .map(str::to_string)
            .collect();
        Self { guarded }
    }

    pub fn is_guarded(&self, author: &str) -> bool {
        self.guarded.iter().any(|nick| nick == author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_known_bot_and_self() {
        let guard = AntiLoopGuard::new("[BoltGitHubBot]", "issuebot");
        assert!(guard.is_guarded("[BoltGitHubBot]"));
        assert!(guard.is_guarded("issuebot"));
        assert!(!guard.is_guarded("alice"));
        assert!(!guard.is_guarded("[boltgithubbot]"));
    }

    #[test]
    fn empty_guard_nick_guards_nobody_else() {
        let guard = AntiLoopGuard::new("", "issuebot");
        assert!(!guard.is_guarded(""));
    }
}
