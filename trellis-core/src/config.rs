use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Settings shared by a root and its handlers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)] // missing fields keep their defaults
pub struct RenderConfig {
    /// Props whose name starts with this register event listeners.
    pub event_prefix: String,
    /// Text of sentinel comments, followed by the region label.
    pub marker_prefix: String,
    /// Log dropped props and children at WARN instead of TRACE.
    pub warn_on_unhandled: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            event_prefix: "on".to_string(),
            marker_prefix: "ref:".to_string(),
            warn_on_unhandled: false,
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_event(&self, name: &str) -> bool {
        name.starts_with(&self.event_prefix)
    }

    /// Event name without the prefix, `None` for plain props.
    pub fn event_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.event_prefix.as_str())
    }

    pub fn marker(&self, label: &str) -> String {
        format!("{}{}", self.marker_prefix, label)
    }
}
