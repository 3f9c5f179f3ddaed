use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::tracker::{CommandError, CommandExecutor, ExecutionError, TrackerCommand, check_request};
use crate::ticket::TicketId;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct CommandRequest<'a> {
    query: &'a str,
    issues: Vec<IssueReference<'a>>,
    #[serde(skip_serializing_if = "str::is_empty")]
    comment: &'a str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct IssueReference<'a> {
    #[serde(rename = "idReadable")]
    id_readable: &'a str,
}

impl<'a> CommandRequest<'a> {
    fn new(ticket: &'a TicketId, command: &'a TrackerCommand) -> Self {
        Self {
            query: &command.query,
            issues: vec![IssueReference {
                id_readable: ticket.as_str(),
            }],
            comment: &command.comment,
        }
    }
}

/// Executes commands through YouTrack's `POST /api/commands` endpoint.
pub struct YouTrackClient {
    client: Client,
    commands_url: String,
    token: String,
}

impl YouTrackClient {
    /// `timeout` bounds each command request, from connect to the end of the body.
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            commands_url: format!("{}/api/commands", base_url.trim_end_matches('/')),
            token: token.into(),
        })
    }
}

#[async_trait]
impl CommandExecutor for YouTrackClient {
    fn name(&self) -> &'static str {
        "YouTrack"
    }

    #[tracing::instrument(skip_all, fields(ticket = %ticket, query = %command.query))]
    async fn execute(
        &self,
        ticket: &TicketId,
        command: &TrackerCommand,
    ) -> Result<(), CommandError> {
        check_request(ticket, command)?;

        let request = CommandRequest::new(ticket, command);
        debug!("YouTrack Request URL: {}", self.commands_url);
        debug!("YouTrack Request: {:?}", request);

        let resp = self
            .client
            .post(&self.commands_url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(ExecutionError::Transport)?;

        let status = resp.status();
        info!("YouTrack Response Status: {}", status);

        let body = resp
            .text()
            .await
            .map_err(|e| ExecutionError::MalformedResponse(e.to_string()))?;
        debug!("YouTrack Response: {}", body);

        if status != StatusCode::OK {
            return Err(ExecutionError::Status { status, body }.into());
        }
        Ok(())
    }
}
