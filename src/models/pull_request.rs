use serde::Deserialize;

use super::github::{GitHubEvent, null_as_default};

/// A `pull_request` webhook delivery, reduced to the fields the relay reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// Passed through as-is: `opened`, `closed`, `reopened`, ...
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pull_request: PullRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,
}

impl GitHubEvent for PullRequestEvent {
    fn action(&self) -> &str {
        &self.action
    }

    fn issue_locator(&self) -> &str {
        &self.pull_request.title
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("title", self.pull_request.title.as_str()),
            ("html_url", self.pull_request.html_url.as_str()),
        ]
    }
}
