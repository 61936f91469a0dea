use serde::Deserialize;

use crate::config::TrackerConfig;

const USER_AGENT: &str = concat!("issuebot/", env!("CARGO_PKG_VERSION"));

/// Why a single issue lookup produced nothing to say.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FetchError {
    /// DNS, connect, TLS or body read failure.
    #[error("tracker request failed: {0}")]
    Transport(String),
    #[error("tracker returned HTTP {0}")]
    HttpStatus(u16),
    #[error("could not decode issue payload: {0}")]
    Decode(String),
}

/// The fields of a tracker issue that replies are built from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssueRecord {
    /// The tracker sends an integer; comparisons follow it as a float.
    pub number: f64,
    pub title: String,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub assignee: Option<Assignee>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Assignee {
    pub login: String,
}

impl IssueRecord {
    #[allow(clippy::float_cmp)]
    pub fn number_is(&self, expected: f64) -> bool {
        self.number == expected
    }

    pub fn number_is_multiple_of(&self, divisor: f64) -> bool {
        self.number % divisor == 0.0
    }

    pub fn assignee_login(&self) -> Option<&str> {
        self.assignee.as_ref().map(|a| a.login.as_str())
    }
}

/// Anything that can turn an issue number into an [`IssueRecord`].
pub trait IssueSource: Send + Sync {
    fn fetch(&self, number: &str) -> Result<IssueRecord, FetchError>;
}

/// Decode a tracker response body. Missing or mistyped required fields are a
/// decode failure, never a panic.
pub fn decode_issue(body: &str) -> Result<IssueRecord, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Blocking client for the tracker's `repos/{owner}/{repo}/issues/{n}` endpoint.
pub struct TrackerClient {
    agent: ureq::Agent,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl TrackerClient {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token: config.token.clone(),
        }
    }

    /// Issue URL without the token, safe to log.
    pub fn issue_url(&self, number: &str) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}",
            self.api_base, self.owner, self.repo, number
        )
    }
}

impl IssueSource for TrackerClient {
    fn fetch(&self, number: &str) -> Result<IssueRecord, FetchError> {
        let url = self.issue_url(number);
        tracing::debug!(%url, "fetching issue");

        let response = self
            .agent
            .get(&url)
            .query("access_token", &self.token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .call();

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) => return Err(FetchError::HttpStatus(code)),
            Err(e) => return Err(FetchError::Transport(e.to_string())),
        };

        let status = response.status().as_u16();
        if !(200..=299).contains(&status) {
            return Err(FetchError::HttpStatus(status));
        }

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        decode_issue(&body)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    const ISSUE_JSON: &str = r#"{
        "number": 42,
        "title": "Fix the thing",
        "state": "open",
        "html_url": "https://github.com/bolt/bolt/issues/42",
        "assignee": {"login": "bopp", "id": 7},
        "labels": []
    }"#;

    /// Serve one canned HTTP response on a random port; returns the base URL and
    /// a receiver for the request head the client sent.
    fn serve_once(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&head).into_owned());
            stream.write_all(response.as_bytes()).unwrap();
        });
        (format!("http://{addr}"), rx)
    }

    fn client(api_base: &str) -> TrackerClient {
        TrackerClient::new(&TrackerConfig {
            token: "secret".into(),
            owner: "bolt".into(),
            repo: "bolt".into(),
            api_base: api_base.into(),
            web_base: "https://github.com".into(),
        })
    }

    #[test]
    fn decode_full_record() {
        let issue = decode_issue(ISSUE_JSON).unwrap();
        assert!(issue.number_is(42.0));
        assert_eq!(issue.title, "Fix the thing");
        assert_eq!(issue.state, "open");
        assert_eq!(issue.assignee_login(), Some("bopp"));
    }

    #[test]
    fn decode_null_or_missing_assignee() {
        let null = r#"{"number": 1, "title": "t", "state": "closed", "html_url": "u", "assignee": null}"#;
        assert_eq!(decode_issue(null).unwrap().assignee, None);
        let missing = r#"{"number": 1, "title": "t", "state": "closed", "html_url": "u"}"#;
        assert_eq!(decode_issue(missing).unwrap().assignee, None);
    }

    #[test]
    fn decode_missing_number_is_decode_error() {
        let body = r#"{"title": "t", "state": "open", "html_url": "u"}"#;
        assert!(matches!(decode_issue(body), Err(FetchError::Decode(_))));
    }

    #[test]
    fn decode_wrong_type_is_decode_error() {
        let body = r#"{"number": "42", "title": "t", "state": "open", "html_url": "u"}"#;
        assert!(matches!(decode_issue(body), Err(FetchError::Decode(_))));
        assert!(matches!(decode_issue("[]"), Err(FetchError::Decode(_))));
        assert!(matches!(decode_issue("<html>"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn multiples_of_1555() {
        let mut issue = decode_issue(ISSUE_JSON).unwrap();
        assert!(!issue.number_is_multiple_of(1555.0));
        issue.number = 3110.0;
        assert!(issue.number_is_multiple_of(1555.0));
    }

    #[test]
    fn issue_url_trims_trailing_slash() {
        let c = client("https://api.example.com/");
        assert_eq!(c.issue_url("7"), "https://api.example.com/repos/bolt/bolt/issues/7");
    }

    #[test]
    fn fetch_success_sends_token_query() {
        let (base, requests) = serve_once("200 OK", ISSUE_JSON);
        let issue = client(&base).fetch("42").unwrap();
        assert!(issue.number_is(42.0));

        let head = requests.recv().unwrap();
        assert!(
            head.starts_with("GET /repos/bolt/bolt/issues/42?access_token=secret "),
            "unexpected request head: {head}"
        );
    }

    #[test]
    fn fetch_not_found_is_http_status() {
        let (base, _requests) = serve_once("404 Not Found", r#"{"message": "Not Found"}"#);
        assert_eq!(client(&base).fetch("999999"), Err(FetchError::HttpStatus(404)));
    }

    #[test]
    fn fetch_bad_body_is_decode_error() {
        let (base, _requests) = serve_once("200 OK", r#"{"message": "rate limited"}"#);
        assert!(matches!(client(&base).fetch("1"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn fetch_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let result = client(&format!("http://{addr}")).fetch("1");
        assert!(matches!(result, Err(FetchError::Transport(_))), "got {result:?}");
    }
}
