use serde::Deserialize;

use super::github::{ANY_ACTION, GitHubEvent, null_as_default};

/// A `push` webhook delivery. Each commit is dispatched as its own event.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: Author,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

impl GitHubEvent for Commit {
    /// Commits have no action verb, so every commit reports [`ANY_ACTION`].
    fn action(&self) -> &str {
        ANY_ACTION
    }

    fn issue_locator(&self) -> &str {
        &self.message
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("commit_id", self.id.as_str()),
            ("commit_message", self.message.as_str()),
            ("commit_author.name", self.author.name.as_str()),
            ("commit_author.email", self.author.email.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_uses_commit_fields() {
        let commit = Commit {
            id: "9f2c".to_string(),
            message: "OPS-4 rotate keys".to_string(),
            author: Author {
                name: "Robin".to_string(),
                email: "robin@example.test".to_string(),
            },
        };

        let comment = commit.render_comment(
            "{{commit_id}}: {{commit_message}} by {{commit_author.name}} <{{commit_author.email}}>",
        );

        assert_eq!(comment, "9f2c: OPS-4 rotate keys by Robin <robin@example.test>");
        assert_eq!(commit.action(), ANY_ACTION);
        assert_eq!(commit.issue_locator(), "OPS-4 rotate keys");
    }
}
