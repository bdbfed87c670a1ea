//! Environment configuration

use crate::classifier::RuleTable;
use crate::responses::{ResponseTable, TableError};
use crate::state_machine::state::{DEFAULT_SEARCH_DELAY, DEFAULT_TYPING_DELAY};
use crate::state_machine::DemoContext;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got '{value}'")]
    InvalidDelay { var: &'static str, value: String },
    #[error("NEWSDESK_OUTPUT must be 'text' or 'json', got '{0}'")]
    InvalidOutput(String),
    #[error(transparent)]
    Catalog(#[from] TableError),
}

/// How the shell renders simulator updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable transcript with progress indicators
    #[default]
    Text,
    /// One JSON event per line
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub search_delay: Duration,
    pub typing_delay: Duration,
    pub responses_path: Option<PathBuf>,
    pub output: OutputMode,
    pub session_id: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            search_delay: DEFAULT_SEARCH_DELAY,
            typing_delay: DEFAULT_TYPING_DELAY,
            responses_path: None,
            output: OutputMode::Text,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(delay) = parse_delay(&lookup, "NEWSDESK_SEARCH_DELAY_MS")? {
            config.search_delay = delay;
        }
        if let Some(delay) = parse_delay(&lookup, "NEWSDESK_TYPING_DELAY_MS")? {
            config.typing_delay = delay;
        }
        config.responses_path = lookup("NEWSDESK_RESPONSES")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        if let Some(output) = lookup("NEWSDESK_OUTPUT") {
            config.output = match output.trim().to_ascii_lowercase().as_str() {
                "" | "text" => OutputMode::Text,
                "json" => OutputMode::Json,
                _ => return Err(ConfigError::InvalidOutput(output)),
            };
        }
        if let Some(id) = lookup("NEWSDESK_SESSION_ID").filter(|id| !id.trim().is_empty()) {
            config.session_id = id;
        }

        Ok(config)
    }

    /// Load the catalog and assemble the session context
    pub fn build_context(&self) -> Result<DemoContext, ConfigError> {
        let responses = match &self.responses_path {
            Some(path) => ResponseTable::load(path)?,
            None => ResponseTable::builtin(),
        };
        let rules = RuleTable::builtin();
        rules.validate(&responses)?;

        Ok(DemoContext::new(self.session_id.clone())
            .with_tables(rules, responses)
            .with_delays(self.search_delay, self.typing_delay))
    }
}

fn parse_delay(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<u64>();
    match parsed {
        Ok(ms) => Ok(Some(Duration::from_millis(ms))),
        Err(_) => Err(ConfigError::InvalidDelay { var, value }),
    }
}
