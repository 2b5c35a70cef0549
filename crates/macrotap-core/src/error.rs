//! Structured errors, serializable for scripting front-ends

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ActionNotFound,
    InvalidAction,
    PresetNotFound,
    InvalidPresetName,
    Storage,
    NoRuntime,
    Unknown,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestions: Vec::new(),
            context: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn action_not_found(id: u32) -> Self {
        Self::new(ErrorCode::ActionNotFound, format!("No action with id {}", id))
    }

    pub fn invalid_action(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAction, reason)
    }

    pub fn preset_not_found(name: &str) -> Self {
        Self::new(ErrorCode::PresetNotFound, format!("Preset not found: {}", name))
            .with_suggestions(vec!["Run `mt list` to see saved presets".to_string()])
    }

    pub fn invalid_preset_name(name: &str) -> Self {
        Self::new(
            ErrorCode::InvalidPresetName,
            format!("Invalid preset name '{}': expected letters, digits, '-' or '_'", name),
        )
    }

    pub fn storage(op: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Storage, format!("{} failed: {}", op, reason))
    }

    pub fn no_runtime() -> Self {
        Self::new(
            ErrorCode::NoRuntime,
            "Playback must be started from within a Tokio runtime",
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::new(ErrorCode::Unknown, e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorCode::Storage, e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorCode::Storage, format!("malformed JSON: {}", e))
    }
}
