use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// One YouTrack command and the comment template posted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    /// YouTrack command query, e.g. `State In Review`. Sent verbatim.
    #[serde(alias = "query", alias = "Command")]
    pub command: String,
    #[serde(default, alias = "Comment")]
    pub comment: String,
}

/// The ordered commands bound to one `(event type, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub event_type: String,
    pub action: String,
    pub commands: Vec<CommandTemplate>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("mapping entry has an empty event name")]
    EmptyEventType,
    #[error("mapping for event {event_type} has an empty action name")]
    EmptyAction { event_type: String },
    #[error("command #{index} for {event_type}/{action} has an empty query")]
    EmptyQuery {
        event_type: String,
        action: String,
        index: usize,
    },
}

/// Result of looking up an event in the [`MappingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    UnknownEventType,
    UnknownAction,
    /// Possibly empty, which means the pair is known but does nothing.
    Commands(&'a [CommandTemplate]),
}

/// Event type → action → commands. Built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    events: HashMap<String, HashMap<String, Vec<CommandTemplate>>>,
}

impl MappingTable {
    /// Builds the table, rejecting entries the executor could not run.
    ///
    /// A later entry for the same `(event type, action)` replaces an earlier one.
    pub fn from_entries(
        entries: impl IntoIterator<Item = MappingEntry>,
    ) -> Result<Self, MappingError> {
        let mut events: HashMap<String, HashMap<String, Vec<CommandTemplate>>> = HashMap::new();

        for entry in entries {
            validate(&entry)?;

            let actions = events.entry(entry.event_type.clone()).or_default();
            if actions.insert(entry.action.clone(), entry.commands).is_some() {
                warn!(
                    event_type = %entry.event_type,
                    action = %entry.action,
                    "duplicate mapping, keeping the last one"
                );
            }
        }

        Ok(Self { events })
    }

    /// Exact, case-sensitive lookup on both keys.
    pub fn resolve(&self, event_type: &str, action: &str) -> Resolution<'_> {
        let Some(actions) = self.events.get(event_type) else {
            return Resolution::UnknownEventType;
        };
        match actions.get(action) {
            Some(commands) => Resolution::Commands(commands),
            None => Resolution::UnknownAction,
        }
    }

    /// Whether any action is registered for `event_type`.
    pub fn handles(&self, event_type: &str) -> bool {
        self.events.contains_key(event_type)
    }

    /// Registered event types with their number of actions, sorted by name.
    pub fn summary(&self) -> Vec<(&str, usize)> {
        let mut summary: Vec<_> = self
            .events
            .iter()
            .map(|(event_type, actions)| (event_type.as_str(), actions.len()))
            .collect();
        summary.sort_unstable();
        summary
    }
}

fn validate(entry: &MappingEntry) -> Result<(), MappingError> {
    if entry.event_type.is_empty() {
        return Err(MappingError::EmptyEventType);
    }
    if entry.action.is_empty() {
        return Err(MappingError::EmptyAction {
            event_type: entry.event_type.clone(),
        });
    }
    if let Some(index) = entry.commands.iter().position(|c| c.command.trim().is_empty()) {
        return Err(MappingError::EmptyQuery {
            event_type: entry.event_type.clone(),
            action: entry.action.clone(),
            index,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn command(query: &str) -> CommandTemplate {
        CommandTemplate {
            command: query.to_string(),
            comment: String::new(),
        }
    }

    fn entry(event_type: &str, action: &str, commands: Vec<CommandTemplate>) -> MappingEntry {
        MappingEntry {
            event_type: event_type.to_string(),
            action: action.to_string(),
            commands,
        }
    }

    #[fixture]
    fn table() -> MappingTable {
        MappingTable::from_entries([
            entry("pull_request", "opened", vec![command("State In Review"), command("tag pr")]),
            entry("pull_request", "edited", vec![]),
            entry("push", "any", vec![command("State In Progress")]),
        ])
        .unwrap()
    }

    #[rstest]
    fn resolves_commands_in_declared_order(table: MappingTable) {
        let Resolution::Commands(commands) = table.resolve("pull_request", "opened") else {
            panic!("expected commands");
        };
        let queries: Vec<_> = commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(queries, ["State In Review", "tag pr"]);
    }

    #[rstest]
    fn empty_command_list_is_a_known_pair(table: MappingTable) {
        assert_eq!(table.resolve("pull_request", "edited"), Resolution::Commands(&[]));
    }

    #[rstest]
    #[case("issues", "opened", Resolution::UnknownEventType)]
    #[case("Pull_Request", "opened", Resolution::UnknownEventType)]
    #[case("pull_request", "closed", Resolution::UnknownAction)]
    #[case("pull_request", "Opened", Resolution::UnknownAction)]
    fn unknown_keys_are_distinguished(
        table: MappingTable,
        #[case] event_type: &str,
        #[case] action: &str,
        #[case] expected: Resolution<'static>,
    ) {
        assert_eq!(table.resolve(event_type, action), expected);
    }

    #[rstest]
    fn summary_lists_event_types(table: MappingTable) {
        assert_eq!(table.summary(), [("pull_request", 2), ("push", 1)]);
        assert!(table.handles("push"));
        assert!(!table.handles("issues"));
    }

    #[test]
    fn later_duplicate_replaces_earlier() {
        let table = MappingTable::from_entries([
            entry("push", "any", vec![command("first")]),
            entry("push", "any", vec![command("second")]),
        ])
        .unwrap();

        assert_eq!(
            table.resolve("push", "any"),
            Resolution::Commands(&[command("second")])
        );
    }

    #[test]
    fn rejects_entries_that_cannot_run() {
        assert_eq!(
            MappingTable::from_entries([entry("", "opened", vec![])]).unwrap_err(),
            MappingError::EmptyEventType
        );
        assert_eq!(
            MappingTable::from_entries([entry("push", "", vec![])]).unwrap_err(),
            MappingError::EmptyAction { event_type: "push".to_string() }
        );
        assert_eq!(
            MappingTable::from_entries([entry("push", "any", vec![command("ok"), command("  ")])])
                .unwrap_err(),
            MappingError::EmptyQuery {
                event_type: "push".to_string(),
                action: "any".to_string(),
                index: 1,
            }
        );
    }
}
