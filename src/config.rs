use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::mapping::{CommandTemplate, MappingEntry, MappingTable};

/// Validated startup settings.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub youtrack_url: String,
    pub youtrack_token: String,
    pub mappings_path: PathBuf,
}

impl Config {
    pub fn new(
        port: u16,
        youtrack_url: &str,
        youtrack_token: &str,
        mappings_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let youtrack_url = remove_quotes(youtrack_url).trim_end_matches('/').to_string();
        let youtrack_token = remove_quotes(youtrack_token).to_string();

        let mut missing = Vec::new();
        if youtrack_url.is_empty() {
            missing.push("YOUTRACK_URL");
        } else if !youtrack_url.starts_with("http://") && !youtrack_url.starts_with("https://") {
            bail!("YOUTRACK_URL must start with http:// or https://");
        }
        if youtrack_token.is_empty() {
            missing.push("YOUTRACK_TOKEN");
        }
        if !missing.is_empty() {
            bail!("missing required settings: {}", missing.join(", "));
        }

        Ok(Self {
            port,
            youtrack_url,
            youtrack_token,
            mappings_path: mappings_path.into(),
        })
    }

    fn masked_token(&self) -> String {
        match self.youtrack_token.get(..4) {
            Some(prefix) if self.youtrack_token.len() > 8 => format!("{prefix}****"),
            _ => "****".to_string(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("youtrack_url", &self.youtrack_url)
            .field("youtrack_token", &self.masked_token())
            .field("mappings_path", &self.mappings_path)
            .finish()
    }
}

fn remove_quotes(input: &str) -> &str {
    input.trim_matches('"')
}

// ---------------------------------------------------------------------------
// Mapping file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MappingFile {
    mappings: Vec<EventMappingConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventMappingConfig {
    event_name: String,
    #[serde(default)]
    github_actions: Vec<ActionMappingConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionMappingConfig {
    github_action: String,
    #[serde(default)]
    youtrack_command: Vec<CommandTemplate>,
}

/// Reads and validates the event → command mapping file.
pub fn load_mappings(path: &Path) -> Result<MappingTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("mapping file {} cannot be read", path.display()))?;
    let table = parse_mappings(&content)
        .with_context(|| format!("invalid mapping file {}", path.display()))?;

    for (event_type, actions) in table.summary() {
        info!("Loaded mapping for {}: {} action(s)", event_type, actions);
    }
    Ok(table)
}

/// Parses mapping file content. JSON is accepted as well as YAML.
pub fn parse_mappings(content: &str) -> Result<MappingTable> {
    let deserializer = serde_yaml::Deserializer::from_str(content);
    let file: MappingFile = serde_path_to_error::deserialize(deserializer)
        .map_err(|e| anyhow::anyhow!("Failed to parse mappings: {}", e))?;

    let entries = file.mappings.into_iter().flat_map(|event| {
        let event_type = event.event_name;
        event
            .github_actions
            .into_iter()
            .map(move |action| MappingEntry {
                event_type: event_type.clone(),
                action: action.github_action,
                commands: action.youtrack_command,
            })
    });

    Ok(MappingTable::from_entries(entries)?)
}
