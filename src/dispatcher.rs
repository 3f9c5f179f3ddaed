//! Turns decoded GitHub events into YouTrack commands.
//!
//! Each event in a delivery is handled on its own: a failing command stops the
//! remaining commands of that event only, and the next event is still processed.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::models::github::GitHubEvent;
use crate::models::mapping::{MappingTable, Resolution};
use crate::models::tracker::{CommandError, CommandExecutor, TrackerCommand};
use crate::ticket::{TicketId, extract_ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownEventType,
    UnknownAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Ignored(IgnoreReason),
    NoOp,
    NoTicket,
    Succeeded,
    Failed,
    /// Shutdown was requested before this event was reached.
    Cancelled,
}

/// What happened to one event of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub ticket: Option<TicketId>,
    pub status: OutcomeStatus,
}

impl Outcome {
    fn without_ticket(status: OutcomeStatus) -> Self {
        Self {
            ticket: None,
            status,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The executor rejected a request the dispatcher should never have built.
    #[error("event #{index} ({ticket}): {source}")]
    Contract {
        index: usize,
        ticket: TicketId,
        #[source]
        source: CommandError,
    },
}

pub struct Dispatcher {
    mapping: Arc<MappingTable>,
    executor: Arc<dyn CommandExecutor>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Dispatcher {
    pub fn new(mapping: Arc<MappingTable>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            mapping,
            executor,
            shutdown: None,
        }
    }

    /// Stops issuing commands for further events once `shutdown` turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    /// Processes every event of one delivery and returns their outcomes in order.
    #[tracing::instrument(skip(self, events), fields(events = events.len()))]
    pub async fn dispatch(
        &self,
        event_type: &str,
        events: &[Box<dyn GitHubEvent>],
    ) -> Result<Vec<Outcome>, DispatchError> {
        let mut outcomes = Vec::with_capacity(events.len());

        for (index, event) in events.iter().enumerate() {
            if self.shutting_down() {
                info!(index, "shutdown requested, skipping remaining events");
                outcomes.push(Outcome::without_ticket(OutcomeStatus::Cancelled));
                continue;
            }
            outcomes.push(self.dispatch_event(index, event_type, event.as_ref()).await?);
        }

        Ok(outcomes)
    }

    async fn dispatch_event(
        &self,
        index: usize,
        event_type: &str,
        event: &dyn GitHubEvent,
    ) -> Result<Outcome, DispatchError> {
        let action = event.action();

        let commands = match self.mapping.resolve(event_type, action) {
            Resolution::UnknownEventType => {
                info!("Ignored event type: {}", event_type);
                return Ok(Outcome::without_ticket(OutcomeStatus::Ignored(
                    IgnoreReason::UnknownEventType,
                )));
            }
            Resolution::UnknownAction => {
                info!("Ignored {} action: {} (no mapping configured)", event_type, action);
                return Ok(Outcome::without_ticket(OutcomeStatus::Ignored(
                    IgnoreReason::UnknownAction,
                )));
            }
            Resolution::Commands([]) => {
                info!("{} action {} maps to no commands", event_type, action);
                return Ok(Outcome::without_ticket(OutcomeStatus::NoOp));
            }
            Resolution::Commands(commands) => commands,
        };

        let Some(ticket) = extract_ticket(event.issue_locator()) else {
            info!("No ticket found in: {:?}", event.issue_locator());
            return Ok(Outcome::without_ticket(OutcomeStatus::NoTicket));
        };

        for template in commands {
            let command = TrackerCommand {
                query: template.command.clone(),
                comment: event.render_comment(&template.comment),
            };

            match self.executor.execute(&ticket, &command).await {
                Ok(()) => {
                    info!(
                        "{} issue {} updated with command '{}'",
                        self.executor.name(),
                        ticket,
                        command.query
                    );
                }
                Err(CommandError::Execution(error)) => {
                    warn!(
                        %error,
                        %ticket,
                        query = %command.query,
                        "command failed, skipping the rest for this event"
                    );
                    return Ok(Outcome {
                        ticket: Some(ticket),
                        status: OutcomeStatus::Failed,
                    });
                }
                Err(source @ CommandError::Contract(_)) => {
                    error!(error = %source, %ticket, "executor precondition violated");
                    return Err(DispatchError::Contract {
                        index,
                        ticket,
                        source,
                    });
                }
            }
        }

        Ok(Outcome {
            ticket: Some(ticket),
            status: OutcomeStatus::Succeeded,
        })
    }

    fn shutting_down(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }
}
