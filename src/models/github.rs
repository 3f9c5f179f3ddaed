use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use thiserror::Error;

use super::{pull_request::PullRequestEvent, push::PushEvent};
use crate::template;

/// `X-GitHub-Event` value for pull request deliveries.
pub const PULL_REQUEST: &str = "pull_request";
/// `X-GitHub-Event` value for push deliveries.
pub const PUSH: &str = "push";

/// Action reported by events that have no action verb of their own.
///
/// A mapping entry registered under this action matches every such event.
pub const ANY_ACTION: &str = "any";

/// One GitHub notification that can be turned into YouTrack commands.
///
/// Implementations are built once from a decoded payload and never change
/// afterwards. Adding a new kind of event means implementing this trait and
/// teaching [`decode_events`] to produce it.
pub trait GitHubEvent: Send + Sync + std::fmt::Debug {
    /// The sub-type used to look up the mapping entry, e.g. `opened`.
    fn action(&self) -> &str;

    /// Free text scanned for the YouTrack issue key.
    fn issue_locator(&self) -> &str;

    /// Placeholder names (without braces) and their values for comment templates.
    fn fields(&self) -> Vec<(&'static str, &str)>;

    /// Fills this event's placeholders in a comment template.
    fn render_comment(&self, template: &str) -> String {
        template::render(template, &self.fields())
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid {event_type} payload: {source}")]
    InvalidPayload {
        event_type: String,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
}

/// Decodes a webhook body into the events it carries.
///
/// Returns `Ok(None)` for event types this relay has no decoder for. A push
/// yields one event per commit, in payload order.
pub fn decode_events(
    event_type: &str,
    body: &[u8],
) -> Result<Option<Vec<Box<dyn GitHubEvent>>>, DecodeError> {
    let events: Vec<Box<dyn GitHubEvent>> = match event_type {
        PULL_REQUEST => {
            let event: PullRequestEvent = parse(event_type, body)?;
            vec![Box::new(event)]
        }
        PUSH => {
            let push: PushEvent = parse(event_type, body)?;
            push.commits
                .into_iter()
                .map(|commit| Box::new(commit) as Box<dyn GitHubEvent>)
                .collect()
        }
        _ => return Ok(None),
    };
    Ok(Some(events))
}

/// Treats an explicit `null` like a missing field. Use with `#[serde(default)]`.
pub(super) fn null_as_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse<T: DeserializeOwned>(event_type: &str, body: &[u8]) -> Result<T, DecodeError> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
        DecodeError::InvalidPayload {
            event_type: event_type.to_string(),
            source,
        }
    })
}
