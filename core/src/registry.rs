//! Records returned by the structured registry listings.
//!
//! These model the resources a tool registry exposes (servers, tools,
//! groups, prompts) and the input schema of a single tool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Transport a registered server is reached over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    #[default]
    StreamableHttp,
    Stdio,
    Sse,
    /// Any transport label the registry prints that is not known here.
    Other(String),
}

impl Transport {
    /// Maps a transport label from listing output.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "streamable_http" => Self::StreamableHttp,
            "stdio" => Self::Stdio,
            "sse" => Self::Sse,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryServer {
    pub name: String,
    pub transport: Transport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub enabled: bool,
}

/// A tool, addressed by its canonical `server__tool` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryTool {
    pub name: String,
    pub server_name: String,
    pub canonical_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// A prompt, addressed by its canonical `server__prompt` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryPrompt {
    pub name: String,
    pub server_name: String,
    pub canonical_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

/// JSON-schema-like description of a tool's input.
///
/// Only `required` and `properties` are interpreted; everything else the
/// registry prints is ignored.
///
/// # Examples
///
/// ```
/// use climb_core::ToolSchema;
///
/// let schema: ToolSchema = serde_json::from_str(
///     r#"{"type":"object","properties":{"q":{},"limit":{}},"required":["q"]}"#,
/// ).unwrap();
/// assert_eq!(schema.required, vec!["q"]);
/// assert_eq!(schema.optional_parameters(), vec!["limit"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Property names not listed in `required`, in property-map order.
    pub fn optional_parameters(&self) -> Vec<&str> {
        self.properties
            .keys()
            .filter(|key| !self.required.contains(key))
            .map(String::as_str)
            .collect()
    }
}
