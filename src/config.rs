//! Client configuration and CLI argument parsing.
//!
//! Model and collection selection live in an explicit [`ClientConfig`]
//! owned by the caller, loadable from a YAML file and overridable by CLI
//! flags via `arrrg`.

use std::path::{Path, PathBuf};

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for the ragline-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Path to a YAML configuration file.
    #[arrrg(optional, "Path to a YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Base URL of the ragline service.
    #[arrrg(optional, "Base URL of the ragline service", "URL")]
    pub base_url: Option<String>,

    /// Model to generate with.
    #[arrrg(optional, "Model to generate with", "MODEL")]
    pub model: Option<String>,

    /// Document collection to retrieve from.
    #[arrrg(optional, "Document collection to retrieve from", "COLLECTION")]
    pub collection: Option<String>,

    /// Path of the chat history file.
    #[arrrg(optional, "Path of the chat history file", "PATH")]
    pub history: Option<String>,
}

/// Resolved configuration for a ragline client and its callers.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the service; falls back to RAGLINE_BASE_URL, then to the
    /// local development default.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Model to generate with; the service picks its default when unset.
    pub model: Option<String>,

    /// Document collection to retrieve from. Chat and comparison requests
    /// are rejected client-side while this is unset.
    pub collection: Option<String>,

    /// Path of the chat history file; history is not persisted when unset.
    pub history_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            model: None,
            collection: None,
            history_path: None,
        }
    }

    /// Loads a configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|err| Error::io("failed to read config file", err))?;
        serde_yaml::from_str(&contents).map_err(|err| {
            Error::serialization("failed to parse config file", Some(Box::new(err)))
        })
    }

    /// Resolves a configuration from CLI arguments, loading the YAML file
    /// first when one is given and overlaying the remaining flags.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::new(),
        };
        if args.base_url.is_some() {
            config.base_url = args.base_url;
        }
        if args.model.is_some() {
            config.model = args.model;
        }
        if args.collection.is_some() {
            config.collection = args.collection;
        }
        if let Some(history) = args.history {
            config.history_path = Some(PathBuf::from(history));
        }
        Ok(config)
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the model to generate with.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the document collection to retrieve from.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Sets the chat history file path.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::new();
        assert!(config.base_url.is_none());
        assert_eq!(config.timeout_secs, 60);
        assert!(config.model.is_none());
        assert!(config.collection.is_none());
        assert!(config.history_path.is_none());
    }

    #[test]
    fn builder_pattern() {
        let config = ClientConfig::new()
            .with_base_url("https://rag.example.com/")
            .with_timeout_secs(120)
            .with_model("qwen3:32b")
            .with_collection("61850")
            .with_history_path("chats.json");
        assert_eq!(config.base_url.as_deref(), Some("https://rag.example.com/"));
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.model.as_deref(), Some("qwen3:32b"));
        assert_eq!(config.collection.as_deref(), Some("61850"));
        assert_eq!(config.history_path, Some(PathBuf::from("chats.json")));
    }

    #[test]
    fn parses_yaml() {
        let yaml = "base_url: https://rag.example.com/\nmodel: llama3.1:latest\ncollection: \"61850\"\n";
        let config: ClientConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://rag.example.com/"));
        assert_eq!(config.model.as_deref(), Some("llama3.1:latest"));
        assert_eq!(config.collection.as_deref(), Some("61850"));
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn args_overlay_config() {
        let args = ChatArgs {
            config: None,
            base_url: Some("https://other.example.com/".to_string()),
            model: Some("qwq:32b".to_string()),
            collection: None,
            history: Some("h.json".to_string()),
        };
        let config = ClientConfig::from_args(args).unwrap();
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://other.example.com/")
        );
        assert_eq!(config.model.as_deref(), Some("qwq:32b"));
        assert!(config.collection.is_none());
        assert_eq!(config.history_path, Some(PathBuf::from("h.json")));
    }
}
