//! Issue key extraction from free text (PR titles, commit messages).

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A YouTrack issue key such as `ABC-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketId(String);

impl TicketId {
    /// Wraps a raw key without validating it.
    ///
    /// Keys found in event text should come from [`extract_ticket`]; this is
    /// for callers that already hold a key.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the leftmost `LETTERS-DIGITS` key in `text`, if any.
///
/// Only uppercase ASCII letters and ASCII digits count, so `abc-123` is not a key.
pub fn extract_ticket(text: &str) -> Option<TicketId> {
    static TICKET_REGEX: OnceLock<Regex> = OnceLock::new();

    let re = TICKET_REGEX
        .get_or_init(|| Regex::new(r"[A-Z]+-[0-9]+").expect("ticket pattern is a valid regex"));

    re.find(text)
        .map(|m| m.as_str().trim())
        .filter(|key| !key.is_empty())
        .map(TicketId::new)
}
