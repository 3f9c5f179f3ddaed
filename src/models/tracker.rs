use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::ticket::TicketId;

/// A command ready to run: the query plus the already rendered comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerCommand {
    pub query: String,
    pub comment: String,
}

/// The tracker could not apply a command. All variants are handled alike by
/// the dispatcher.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to reach the tracker: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("tracker answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed tracker response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// The caller broke the executor's preconditions. This is a bug in the
    /// relay, not a tracker problem.
    #[error("invalid command request: {0}")]
    Contract(&'static str),
}

/// Runs one command against one issue in the tracker.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Name of the tracker, for logs.
    fn name(&self) -> &'static str;

    /// Requires a non-empty `ticket` and a non-empty `command.query`.
    async fn execute(
        &self,
        ticket: &TicketId,
        command: &TrackerCommand,
    ) -> Result<(), CommandError>;
}

/// Precondition check shared by executor implementations.
pub fn check_request(ticket: &TicketId, command: &TrackerCommand) -> Result<(), CommandError> {
    if ticket.is_empty() {
        return Err(CommandError::Contract("ticket id is required"));
    }
    if command.query.trim().is_empty() {
        return Err(CommandError::Contract("command query is not specified"));
    }
    Ok(())
}
