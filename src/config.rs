//! Client configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for a [`Client`](crate::client::Client).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Endpoint URL calls are addressed to
    #[serde(default)]
    pub endpoint: String,

    /// Wrap the encoded call arguments in a single-element array
    #[serde(default = "default_true")]
    pub wrap_arguments_in_array: bool,

    /// Headers attached to every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Content type for outgoing requests
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Log calls as they move through the pipeline
    #[serde(default = "default_true")]
    pub log_calls: bool,
}

fn default_true() -> bool {
    true
}

fn default_content_type() -> String {
    "application/soap+xml; charset=\"utf-8\"".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            wrap_arguments_in_array: true,
            headers: HashMap::new(),
            content_type: default_content_type(),
            log_calls: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.content_type.is_empty() {
            anyhow::bail!("content_type cannot be empty");
        }
        for name in self.headers.keys() {
            if name.is_empty() {
                anyhow::bail!("header names cannot be empty");
            }
        }
        Ok(())
    }
}
